pub fn execute(global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let layout = global.layout();
    let report = layout.provision()?;

    tracing::info!(
        "Volume '{}' ready: {} file(s) provided, {} already present",
        layout.dist_dir().display(),
        report.provided.len(),
        report.present.len()
    );
    for entry in &report.provided {
        println!("{}", entry.display());
    }
    Ok(())
}
