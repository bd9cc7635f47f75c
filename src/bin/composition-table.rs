use std::fs::File;
use std::io::BufReader;

use anyhow::{bail, Context, Result};
use csv::Writer;
use glycan::*;
use tracing::*;

fn main() -> Result<()> {
    init_logging("info");
    let args: Vec<String> = std::env::args().collect();
    let (Some(input), Some(output)) = (args.get(1), args.get(2)) else {
        bail!("usage: {} <input> <output.csv>", args[0]);
    };

    let file = File::open(input).with_context(|| format!("Failed to open {}", input))?;
    let mut wtr = Writer::from_writer(File::create(output)?);
    wtr.write_record(["index", "nodes", "links", "composition", "glycoct"])?;

    let mut count = 0;
    for (i, glycan) in GlycoctReader::new(BufReader::new(file)).enumerate() {
        let glycan = glycan.with_context(|| format!("Failed to read glycan {} from {}", i + 1, input))?;
        wtr.write_record([
            (i + 1).to_string(),
            glycan.len().to_string(),
            glycan.link_count().to_string(),
            glycan.composition().to_string(),
            glycan.to_glycoct(),
        ])?;
        count += 1;
    }
    wtr.flush()?;
    info!("Wrote {} glycans to {}", count, output);
    Ok(())
}
