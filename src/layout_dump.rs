use crate::layout::{ConnectorKind, TreeLayout};
use crate::member::MemberId;
use crate::presentation::PresentationState;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDump {
    pub generations: Vec<GenerationDump>,
    pub families: Vec<FamilyDump>,
    pub connectors: Vec<ConnectorDump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation: Option<PresentationDump>,
}

#[derive(Debug, Serialize)]
pub struct GenerationDump {
    pub generation: i64,
    pub members: Vec<MemberId>,
}

#[derive(Debug, Serialize)]
pub struct FamilyDump {
    pub key: String,
    pub parents: Vec<MemberId>,
    pub children: Vec<MemberId>,
}

#[derive(Debug, Serialize)]
pub struct ConnectorDump {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ConnectorKind,
    pub d: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationDump {
    pub generation: Option<i64>,
    #[serde(flatten)]
    pub state: PresentationState,
}

impl TreeDump {
    pub fn from_tree(tree: &TreeLayout, presentation: Option<(Option<i64>, PresentationState)>) -> Self {
        let generations = tree
            .generations
            .iter()
            .map(|(generation, members)| GenerationDump {
                generation,
                members: members.iter().map(|m| m.id.clone()).collect(),
            })
            .collect();

        let families = tree
            .families
            .iter()
            .map(|family| FamilyDump {
                key: family.key.clone(),
                parents: family.parents.clone(),
                children: family.children.clone(),
            })
            .collect();

        let connectors = tree
            .connectors
            .iter()
            .map(|connector| ConnectorDump {
                id: connector.id.clone(),
                kind: connector.kind,
                d: connector.path.to_svg_d(),
            })
            .collect();

        TreeDump {
            generations,
            families,
            connectors,
            presentation: presentation.map(|(generation, state)| PresentationDump { generation, state }),
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or stdout when `None`.
pub fn write_tree_dump(path: Option<&Path>, dump: &TreeDump) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, dump)?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, dump)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}
