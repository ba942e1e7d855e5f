//! Run the relink stages over the tree
//!
//! With `--interactive`, each selected stage is confirmed before the run
//! starts; declined stages are dropped from the run.

use std::io::{self, Write};

use vault_relink::util::display_path;
use vault_relink::{MarkdownLog, RelinkError, Result, RunStats, Runner, Settings, Stage};

pub fn run(settings: Settings, interactive: bool, json: bool) -> Result<()> {
    let runner = match prepare(settings.clone(), interactive, &mut ask)? {
        Some(runner) => runner,
        None => {
            println!("No stages selected. Aborted.");
            return Ok(());
        }
    };

    let mut log =
        MarkdownLog::create(&settings.log_file).map_err(|e| RelinkError::io(&settings.log_file, e))?;

    let stats = runner.run(&mut log);
    log.flush().map_err(|e| RelinkError::io(&settings.log_file, e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&runner, &stats);
        println!("Log written to {}", display_path(&settings.log_file));
    }
    Ok(())
}

/// Check the root, then narrow the stage set by asking about each stage.
/// Returns `None` when every stage was declined.
fn prepare<F>(mut settings: Settings, interactive: bool, ask: &mut F) -> Result<Option<Runner>>
where
    F: FnMut(&str) -> Result<bool>,
{
    settings.resolve_root()?;

    if interactive {
        let mut accepted = Vec::new();
        for stage in Stage::ALL {
            if !settings.runs(stage) {
                continue;
            }
            if ask(&format!("Run part {}: {}? [y/N] ", stage.number(), stage.title()))? {
                accepted.push(stage);
            }
        }
        if accepted.is_empty() {
            return Ok(None);
        }
        settings.stages = accepted.into_iter().collect();
    }

    Runner::new(&settings).map(Some)
}

fn ask(question: &str) -> Result<bool> {
    print!("{}", question);
    io::stdout().flush().map_err(|e| RelinkError::io("<stdout>", e))?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| RelinkError::io("<stdin>", e))?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}

pub(crate) fn print_summary(runner: &Runner, stats: &RunStats) {
    println!("Root: {}", display_path(runner.root()));
    println!("  Files processed:      {}", stats.files_processed);
    println!("  Wiki links converted: {}", stats.wiki_links_converted);
    println!("  Links rewritten:      {}", stats.links_rewritten);
    println!("  Placeholders created: {}", stats.placeholders_created);
    println!("  Directories indexed:  {}", stats.directories_indexed);
    println!("  Errors:               {}", stats.errors);
}
