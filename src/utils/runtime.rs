use anyhow::Result;

/// The daemon samples once a second and does little else, one thread is plenty.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .thread_name("focuswatch-daemon")
        .build()?;
    Ok(runtime)
}
