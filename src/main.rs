mod cli;

fn main() -> anyhow::Result<()> {
    flowheroes::logging::init();
    cli::run()
}
