mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "enclink", version, about = "Enclave UART bridge CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "enclink",
            "send",
            "/dev/ttyS1",
            "--type",
            "0x0099",
            "--data",
            "hello",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.frame_type, Some(0x0099));
                assert_eq!(args.device.baud_rate, 9600);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "enclink",
            "send",
            "/dev/ttyS1",
            "--type",
            "1",
            "--hex",
            "0a0b",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn send_requires_type_unless_raw() {
        let err = Cli::try_parse_from(["enclink", "send", "/dev/ttyS1", "--data", "x"])
            .expect_err("missing --type should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        Cli::try_parse_from(["enclink", "send", "/dev/ttyS1", "--raw", "--data", "x"])
            .expect("--raw needs no type");
    }

    #[test]
    fn parses_bridge_subcommand() {
        let cli = Cli::try_parse_from([
            "enclink",
            "bridge",
            "/dev/ttyS1",
            "--baud-rate",
            "115200",
            "--forward-stdin",
        ])
        .expect("bridge args should parse");

        match cli.command {
            Command::Bridge(args) => {
                assert_eq!(args.device.baud_rate, 115200);
                assert!(args.forward_stdin);
                assert!(!args.nonblocking);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_decode_without_file() {
        let cli = Cli::try_parse_from(["enclink", "--format", "json", "decode"])
            .expect("decode args should parse");
        assert!(matches!(cli.command, Command::Decode(ref args) if args.input.is_none()));
    }
}
