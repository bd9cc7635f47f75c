use std::fs::File;
use std::io::BufReader;

use anyhow::{bail, Context, Result};
use glycan::*;
use tracing::*;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(input) = args.get(1) else {
        bail!("usage: {} <input> [dot-prefix] [log-level]", args[0]);
    };
    let dot_prefix = args.get(2);
    init_logging(args.get(3).map(String::as_str).unwrap_or("info"));

    let file = File::open(input).with_context(|| format!("Failed to open {}", input))?;
    for (i, glycan) in GlycoctReader::new(BufReader::new(file)).enumerate() {
        let glycan = glycan.with_context(|| format!("Failed to read glycan {} from {}", i + 1, input))?;
        println!("Glycan {}: {} nodes", i + 1, glycan.len());
        println!("Composition: {}", glycan.composition());
        println!("{}", glycan);

        if let Some(prefix) = dot_prefix {
            let dot_path = format!("{}-{}.dot", prefix, i + 1);
            visualize_glycan(&glycan, &dot_path, None)?;
        }
    }
    info!("Done reading {}", input);
    Ok(())
}
