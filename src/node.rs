//! Node registration surface.
//!
//! The upstream host application discovers plugins through a class-key to
//! display-name mapping. Outside that host this reduces to a plain
//! descriptor table plus a one-shot entry point taking the per-call
//! credential.

use super::{
    client::Client,
    error::Result,
    image::ImageBuffer,
    workflow::GenerationParams,
};

/// Registration entry for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// Unique registration key.
    pub key: &'static str,
    /// Human-readable display name.
    pub display_name: &'static str,
}

/// The Kontext image-to-image node.
pub const KONTEXT_NODE: NodeDescriptor = NodeDescriptor {
    key: "ModelScopeKontextAPI",
    display_name: "ModelScope Kontext API",
};

const NODES: [NodeDescriptor; 1] = [KONTEXT_NODE];

/// Returns every node this crate registers.
pub fn registry() -> &'static [NodeDescriptor] {
    &NODES
}

/// One-shot node entry point.
pub struct KontextNode;

impl KontextNode {
    /// Returns this node's registration descriptor.
    pub fn descriptor() -> NodeDescriptor {
        KONTEXT_NODE
    }

    /// Runs one generation with a per-call credential.
    ///
    /// Builds a fresh client for the invocation; no state is carried
    /// between calls.
    pub async fn run(
        image: &ImageBuffer,
        api_key: &str,
        params: &GenerationParams,
    ) -> Result<ImageBuffer> {
        let client = Client::new(api_key)?;
        client.generate(image, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_maps_key_to_display_name() {
        let nodes = registry();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].key, "ModelScopeKontextAPI");
        assert_eq!(nodes[0].display_name, "ModelScope Kontext API");
        assert_eq!(KontextNode::descriptor(), KONTEXT_NODE);
    }
}
