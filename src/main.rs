use anyhow::Context;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let app = moonfall::MoonfallApp::new().context("failed to initialize the scene")?;
    app.run()
}
