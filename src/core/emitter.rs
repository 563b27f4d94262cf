use crate::domain::model::InventoryDocument;
use crate::utils::error::Result;
use std::io::Write;

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// `--list`: the whole inventory.
    List,
    /// `--host <name>`: hostvars already ship in `_meta`, so this is always `{}`.
    Host(Option<String>),
}

/// A rendered response; only list output carries a document.
#[derive(Debug, Clone, Copy)]
pub enum Output<'a> {
    List(&'a InventoryDocument),
    Host(Option<&'a str>),
}

/// Writes `output` as 2-space indented JSON plus a newline.
pub fn emit<W: Write>(writer: &mut W, output: Output<'_>) -> Result<()> {
    match output {
        Output::List(inventory) => {
            serde_json::to_writer_pretty(&mut *writer, inventory)?;
        }
        Output::Host(hostname) => {
            tracing::debug!("Host query for {:?}, variables are served via _meta", hostname);
            writer.write_all(b"{}")?;
        }
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
