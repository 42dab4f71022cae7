//! `cotick version`

pub fn execute() -> anyhow::Result<i32> {
    println!("cotick v{}", env!("CARGO_PKG_VERSION"));
    Ok(0)
}
