mod cli;

use clap::Parser;

use cli::CompileArgs;

#[derive(Parser)]
#[command(name = "jlite-compile", version, about = "JLite compiler front end")]
struct Cli {
    #[command(flatten)]
    args: CompileArgs,
}

fn main() {
    let cli = Cli::parse();
    cli::cmd_compile(cli.args);
}
