use std::io;
use std::path::Path;
use std::process::Command;

use tracing::*;

use crate::*;

/// Write `glycan` as a Graphviz digraph to `dot_path`. With `png_path`, also
/// render that file to PNG through the `dot` executable, which must be on
/// the `PATH`. A non-zero exit from `dot` is reported as an error.
pub fn visualize_glycan(
    glycan: &Glycan,
    dot_path: impl AsRef<Path>,
    png_path: Option<&Path>,
) -> io::Result<()> {
    let dot_path = dot_path.as_ref();
    std::fs::write(dot_path, generate_dot(glycan))?;
    info!("Wrote {} nodes to {}", glycan.len(), dot_path.display());

    let Some(png_path) = png_path else {
        return Ok(());
    };
    let status = Command::new("dot")
        .arg("-Tpng")
        .arg(dot_path)
        .arg("-o")
        .arg(png_path)
        .status()?;
    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("dot exited with {status} rendering {}", dot_path.display()),
        ));
    }
    debug!("Rendered {}", png_path.display());
    Ok(())
}

/// Symbol Nomenclature for Glycans fill colour for a stem.
fn stem_to_color(stem: Stem) -> &'static str {
    match stem {
        Stem::Glc => "\"#0072BC\"",
        Stem::Man => "\"#00A651\"",
        Stem::Gal => "\"#FFD400\"",
        Stem::Gul => "\"#F47920\"",
        Stem::Alt => "\"#F69EA1\"",
        Stem::All => "\"#A54399\"",
        Stem::Tal => "\"#8FCCE9\"",
        Stem::Ido => "\"#A17A4D\"",
        _ => "white",
    }
}

fn node_label(node: &Node) -> String {
    match &node.kind {
        NodeKind::Monosaccharide(residue) => residue.composition_key(),
        NodeKind::Substituent(substituent) => substituent.name.to_string(),
    }
}

fn node_style(node: &Node) -> (&'static str, &'static str) {
    match &node.kind {
        NodeKind::Monosaccharide(residue) => {
            // The last stem names the residue, e.g. gal in dgro-dgal-NON.
            let stem = residue.stem.last().copied().unwrap_or(Stem::Missing);
            ("box", stem_to_color(stem))
        }
        NodeKind::Substituent(_) => ("ellipse", "lightgray"),
    }
}

/// Generates a DOT digraph of the glycan, with residues coloured by stem and
/// links labelled with their positions.
pub fn generate_dot(glycan: &Glycan) -> String {
    let mut lines = vec!["digraph Glycan {".to_string(), "    rankdir=RL;".to_string()];

    for (ix, node) in glycan.nodes() {
        let (shape, color) = node_style(node);
        lines.push(format!(
            "    {} [label=\"{}\", shape={}, style=filled, fillcolor={}];",
            ix.index(),
            node_label(node),
            shape,
            color
        ));
    }

    for (ix, _) in glycan.nodes() {
        for (child, link) in glycan.children(ix) {
            lines.push(format!(
                "    {} -> {} [label=\"{}-{}\"];",
                ix.index(),
                child.index(),
                position_to_glycoct(link.parent_position),
                position_to_glycoct(link.child_position)
            ));
        }
    }

    lines.push("}".to_string());
    trace!("Generated DOT for {} nodes", glycan.len());
    lines.join("\n") + "\n"
}
