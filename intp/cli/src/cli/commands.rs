use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a snippet of python code, or the contents of a script file
    #[command(visible_aliases = ["e", "exec"])]
    Execute {
        /// inline code, or a path to a python file
        code_or_path: String,

        /// print the captured output as a json object
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive session reading from stdin
    Repl,
}
