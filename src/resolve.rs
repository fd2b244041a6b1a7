//! Format Resolver (spec.md §4.4 steps 1-3): propagates buffer formats
//! depth-first from the root, splicing in automatic converters where a
//! child's declared input kind doesn't match its parent's resolved output
//! kind, and records the stable execution order.

use crate::error::{CoreError, Result};
use crate::format::BufferFormat;
use crate::graph::{Graph, NodeId, NodeKind};
use crate::registry::Registry;

fn input_kind_of(graph: &Graph, registry: &Registry, id: NodeId) -> &'static str {
    match &graph.node(id).kind {
        NodeKind::Root { .. } => "any",
        NodeKind::Transform(instance) => {
            registry
                .lookup(&instance.name)
                .map(|d| d.input_kind)
                .unwrap_or("any")
        }
    }
}

/// Resolves every node's format starting from `root_format` and returns the
/// depth-first pre-order execution order (root included, ties broken by
/// child insertion order).
pub fn resolve(graph: &mut Graph, registry: &Registry, root_format: BufferFormat) -> Result<Vec<NodeId>> {
    match &mut graph.node_mut(graph.root).kind {
        NodeKind::Root { format } => *format = Some(root_format),
        NodeKind::Transform(_) => unreachable!("graph root is always NodeKind::Root"),
    }

    let mut order = vec![graph.root];
    resolve_children(graph, registry, graph.root, &mut order)?;
    Ok(order)
}

fn resolve_children(graph: &mut Graph, registry: &Registry, parent_id: NodeId, order: &mut Vec<NodeId>) -> Result<()> {
    let parent_output = graph
        .node(parent_id)
        .output_format()
        .cloned()
        .expect("parent format resolved before its children");
    let parent_kind = parent_output.kind_tag();
    let parent_name = graph.node(parent_id).name().to_string();

    let children = graph.node(parent_id).children.clone();
    for mut child_id in children {
        let declared_input_kind = input_kind_of(graph, registry, child_id);
        if declared_input_kind != "any" && declared_input_kind != parent_kind {
            let converter_name = registry
                .find_converter(parent_kind, declared_input_kind)
                .ok_or_else(|| CoreError::IncompatibleFormats {
                    parent: parent_name.clone(),
                    child: graph.node(child_id).name().to_string(),
                    parent_format: parent_output.clone(),
                    parent_kind,
                    child_kind: declared_input_kind,
                })?;
            let converter = registry.instantiate(converter_name, &Default::default())?;
            child_id = graph.splice_converter(parent_id, child_id, converter);
        }

        set_input_format(graph, child_id, parent_output.clone())?;
        order.push(child_id);
        resolve_children(graph, registry, child_id, order)?;
    }

    Ok(())
}

fn set_input_format(graph: &mut Graph, node_id: NodeId, format: BufferFormat) -> Result<()> {
    match &mut graph.node_mut(node_id).kind {
        NodeKind::Root { .. } => unreachable!("only the synthetic root lacks an input format source"),
        NodeKind::Transform(instance) => {
            instance.set_input_format(format)?;
            instance.initialize()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ElementKind;
    use crate::graph::GraphBuilder;
    use crate::parser;

    fn pcm_format(samples: usize, sampling_rate: u32) -> BufferFormat {
        BufferFormat::new(ElementKind::Int16, 1)
            .with_sampling_rate(sampling_rate)
            .with_element_array_length(samples)
    }

    #[test]
    fn resolves_simple_chain() {
        let registry = Registry::new();
        let feature = parser::parse("A[Window(length=32), RDFT]", &registry).unwrap();
        let mut builder = GraphBuilder::new(&registry);
        builder.add_feature(&feature).unwrap();
        let mut graph = builder.build();

        let order = resolve(&mut graph, &registry, pcm_format(48_000, 16_000)).unwrap();
        assert_eq!(order.len(), 3);
        for &id in &order {
            assert!(graph.node(id).output_format().is_some());
        }
    }

    #[test]
    fn inserts_converter_for_int16_then_float_chain() {
        let registry = Registry::new();
        let feature = parser::parse("A[Int16ToFloat, DCT]", &registry).unwrap();
        let mut builder = GraphBuilder::new(&registry);
        builder.add_feature(&feature).unwrap();
        let mut graph = builder.build();
        let order = resolve(&mut graph, &registry, pcm_format(1024, 16_000)).unwrap();
        // No converter should be needed here since Int16ToFloat already
        // declares int16 input; this exercises the non-conversion path.
        assert_eq!(order.len(), 3);
    }
}
