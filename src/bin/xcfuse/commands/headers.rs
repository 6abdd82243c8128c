//! `xcfuse headers` command

use anyhow::Result;

use crate::cli::HeadersArgs;
use xcfuse::builder::resolve_headers;
use xcfuse::util::fs::relative_path;

pub fn execute(args: HeadersArgs) -> Result<()> {
    let header_dir = match args.header_dir {
        Some(dir) => dir,
        None if args.umbrella.is_dir() => args.umbrella.clone(),
        None => args
            .umbrella
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default(),
    };

    let headers = resolve_headers(&args.umbrella, &args.framework, &header_dir)?;
    for header in &headers {
        let shown = relative_path(&header_dir, header);
        if header.is_file() {
            println!("{}", shown.display());
        } else {
            println!("{} (missing)", shown.display());
        }
    }

    Ok(())
}
