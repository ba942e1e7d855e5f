//! Create missing directory index documents without touching any other file

use vault_relink::util::display_path;
use vault_relink::{MarkdownLog, RelinkError, Result, Runner, Settings};

pub fn run(settings: &Settings, json: bool) -> Result<()> {
    let runner = Runner::new(settings)?;
    let mut log =
        MarkdownLog::create(&settings.log_file).map_err(|e| RelinkError::io(&settings.log_file, e))?;

    let stats = runner.index_tree(&mut log);
    log.flush().map_err(|e| RelinkError::io(&settings.log_file, e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        super::run::print_summary(&runner, &stats);
        println!("Log written to {}", display_path(&settings.log_file));
    }
    Ok(())
}
