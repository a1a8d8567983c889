pub(crate) mod report {
    use std::{net::SocketAddr, path::Path};

    use colored::Colorize;
    use faker_server::{report, ReportMode};

    use crate::errors::FakerError;

    /// reports to stdout which feature and test case are being served
    pub(crate) fn feature(feature: &str, test_case: &str) {
        println!(
            "\n\n🚀 Running {} feature for test case: {}",
            format!(" {feature} ").on_bright_blue(),
            format!(" {test_case}").blue()
        );
    }

    /// warns that the default SDL file is used
    pub(crate) fn default_sdl_file(path: &Path) {
        eprintln!(
            "{}{}{}",
            "Default file ".yellow(),
            path.display().to_string().magenta(),
            " is used. Specify [SDL_FILE] as argument to change.".yellow()
        );
    }

    /// prints the user SDL after the fixtures were substituted
    pub(crate) fn substituted_sdl(sdl: &str) {
        println!("\n{}", sdl.cyan());
    }

    /// reports to stdout that the server has started
    pub(crate) fn ready(address: SocketAddr, editor: bool) {
        println!("\n{} Your GraphQL Fake API is ready to use 🚀", "✔".green());
        println!("  Here are your links:\n");

        if editor {
            println!("  {} Interactive Editor: http://{address}/editor", "❯".blue());
        }

        println!("  {} GraphQL API:        http://{address}/graphql\n", "❯".blue());
    }

    /// reports an error to stderr
    pub(crate) fn error(error: &FakerError) {
        if let Some(errors) = error.validation_errors() {
            eprintln!("\n{}\n", report(errors, ReportMode::Fatal));
            return;
        }

        eprintln!("{}", format!("Error: {error}").bright_red());

        if let Some(hint) = error.to_hint() {
            eprintln!("{}", format!("Hint: {hint}").bright_blue());
        }
    }
}
