use vault_relink::util::display_path;
use vault_relink::{check_tree, RelinkError, Result, Settings};

pub fn run(settings: &Settings, json: bool) -> Result<()> {
    let root = settings.resolve_root()?;
    let report = check_tree(&root, settings.skip_hidden).map_err(|e| RelinkError::io(&root, e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for broken in &report.broken {
            let kind = if broken.image { "broken image" } else { "broken link" };
            println!(
                "{}:{}: {} -> {}",
                display_path(&broken.source),
                broken.line,
                kind,
                broken.target
            );
        }
        println!(
            "Checked {} link(s) in {} document(s)",
            report.links, report.documents
        );
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(RelinkError::BrokenLinks(report.broken.len()))
    }
}
