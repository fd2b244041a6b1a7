//! GraphViz DOT rendering of a planned arena (spec.md §6 `pipeline_dot`).

use crate::graph::Graph;
use crate::planner::PlannedArena;

pub fn render(graph: &Graph, arena: &PlannedArena) -> String {
    let mut out = String::from("digraph BuffersAllocator {\n");

    for id in graph.ids() {
        let node = graph.node(id);
        let offset = arena.offsets[id];
        let end = offset + arena.sizes[id];
        let label = format!("{} [{offset}, {end}]", node.name());
        if node.is_leaf() {
            out.push_str(&format!(
                "  n{id} [label=\"{label}\", style=filled, fillcolor=green];\n"
            ));
        } else {
            out.push_str(&format!("  n{id} [label=\"{label}\"];\n"));
        }
    }

    for id in graph.ids() {
        for &child in &graph.node(id).children {
            out.push_str(&format!("  n{id} -> n{child};\n"));
        }
    }

    for pair in arena.next.windows(2) {
        out.push_str(&format!("  n{} -> n{} [color=red];\n", pair[0], pair[1]));
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{BufferFormat, ElementKind};
    use crate::graph::GraphBuilder;
    use crate::planner::{Planner, DEFAULT_TRAVERSAL_CAP};
    use crate::registry::Registry;
    use crate::resolve::resolve;

    #[test]
    fn renders_a_named_digraph_with_leaf_fill_and_next_edges() {
        let registry = Registry::new();
        let feature = crate::parser::parse("A[Window(length=32), RDFT]", &registry).unwrap();
        let mut builder = GraphBuilder::new(&registry);
        builder.add_feature(&feature).unwrap();
        let mut graph = builder.build();
        let pcm = BufferFormat::new(ElementKind::Int16, 1)
            .with_sampling_rate(16_000)
            .with_element_array_length(48_000);
        resolve(&mut graph, &registry, pcm).unwrap();
        let arena = Planner::new(DEFAULT_TRAVERSAL_CAP).plan(&graph).unwrap();

        let dot = render(&graph, &arena);
        assert!(dot.starts_with("digraph BuffersAllocator {\n"));
        assert!(dot.contains("fillcolor=green"));
        assert!(dot.contains("color=red"));
    }
}
