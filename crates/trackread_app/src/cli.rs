use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use std::path::PathBuf;
use trackread_core::{RegionRequest, SessionConfig};

#[derive(Parser, Debug)]
#[command(name = "trackread")]
#[command(
    author,
    version,
    about = "Dump floppy tracks or sectors to a file or as a hexdump",
    long_about = None
)]
#[command(group(ArgGroup::new("region").required(true).args(["track", "sector"])))]
pub struct Cli {
    /// First track to read
    #[arg(short, long, value_name = "TRACK")]
    pub track: Option<u32>,

    /// First sector to read
    #[arg(short, long, value_name = "SECTOR")]
    pub sector: Option<u32>,

    /// Number of tracks or sectors to read
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Floppy unit to read from
    #[arg(
        short = 'd',
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(0..4),
        conflicts_with = "image"
    )]
    pub unit: u32,

    /// Write raw sectors to FILE instead of printing a hexdump
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Read from a disk image or device node instead of a floppy unit
    #[arg(short, long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// Print the drive geometry and log every device command
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Parses the command line. Help and version exit 0; any usage error
    /// prints the error and the full usage to stderr and exits 1.
    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
                ) =>
            {
                err.exit()
            }
            Err(err) => {
                let _ = err.print();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    pub fn request(&self) -> Option<RegionRequest> {
        match (self.track, self.sector) {
            (Some(track), _) => Some(RegionRequest::tracks(track, self.count)),
            (None, Some(sector)) => Some(RegionRequest::sectors(sector, self.count)),
            (None, None) => None,
        }
    }

    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let request = self
            .request()
            .ok_or_else(|| anyhow::anyhow!("one of --track or --sector is required"))?;

        let mut config = SessionConfig::new(request)
            .with_unit(self.unit)
            .verbose(self.verbose);
        if let Some(image) = &self.image {
            config = config.with_image(image);
        }
        if let Some(output) = &self.output {
            config = config.with_output(output);
        }
        Ok(config)
    }
}

pub fn print_usage() {
    eprintln!();
    eprintln!("{}", Cli::command().render_long_help());
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackread_core::DeviceTarget;

    #[test]
    fn test_track_request_with_defaults() {
        let cli = Cli::try_parse_from(["trackread", "-t", "40"]).unwrap();
        let config = cli.session_config().unwrap();
        assert_eq!(config.request, RegionRequest::tracks(40, 1));
        assert_eq!(config.target, DeviceTarget::Unit(0));
        assert!(config.output.is_none());
        assert!(!config.verbose);
    }

    #[test]
    fn test_sector_request_with_everything() {
        let cli = Cli::try_parse_from([
            "trackread", "--sector", "880", "-c", "2", "-d", "3", "-o", "root.bin", "-v",
        ])
        .unwrap();
        let config = cli.session_config().unwrap();
        assert_eq!(config.request, RegionRequest::sectors(880, 2));
        assert_eq!(config.target, DeviceTarget::Unit(3));
        assert_eq!(config.output, Some(PathBuf::from("root.bin")));
        assert!(config.verbose);
    }

    #[test]
    fn test_image_replaces_unit() {
        let cli = Cli::try_parse_from(["trackread", "-s", "0", "-i", "disk.adf"]).unwrap();
        let config = cli.session_config().unwrap();
        assert_eq!(config.target, DeviceTarget::Path(PathBuf::from("disk.adf")));
    }

    #[test]
    fn test_addressing_is_required_and_exclusive() {
        let err = Cli::try_parse_from(["trackread"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from(["trackread", "-t", "0", "-s", "0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_out_of_bound_values_are_rejected() {
        for args in [
            &["trackread", "-t", "0", "-c", "0"][..],
            &["trackread", "-t", "0", "-d", "4"][..],
            &["trackread", "-t", "-1"][..],
            &["trackread", "-s", "x"][..],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?} should fail");
        }
    }

    #[test]
    fn test_image_conflicts_with_unit() {
        let err =
            Cli::try_parse_from(["trackread", "-t", "0", "-d", "1", "-i", "a.adf"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
