use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

const INPUT_FILE: &str = "INPUT_FILE";
const APP_ID: &str = "APP_ID";
const BOOK_DUMP: &str = "BOOK_DUMP";

/// Runtime configuration, read from the environment (`.env` aware).
/// Command-line flags take precedence over these values.
#[derive(Clone, Debug)]
pub struct Config {
    /// Optional input file to process instead of the built-in fixture.
    pub input_file: Option<PathBuf>,
    /// Application identifier used in log output.
    pub app_id: String,
    /// Whether the driver prints the final order book.
    pub book_dump: bool,
}

impl Config {
    pub fn from_env() -> Config {
        match Self::try_from_env() {
            Ok(config) => config,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_from_env() -> Result<Config, String> {
        // Load .env file
        dotenv().ok();

        let input_file = env::var(INPUT_FILE).ok().map(PathBuf::from);

        let app_id = env::var(APP_ID).unwrap_or_else(|_| "matchbook".to_string());

        let book_dump = match env::var(BOOK_DUMP) {
            Ok(value) => match value.trim() {
                "1" | "true" | "TRUE" => true,
                "0" | "false" | "FALSE" => false,
                other => {
                    return Err(format!(
                        "failed to parse environment variable {}: {:?}",
                        BOOK_DUMP, other
                    ))
                }
            },
            Err(_) => false,
        };

        Ok(Config {
            input_file,
            app_id,
            book_dump,
        })
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            input_file: None,
            app_id: "matchbook".to_string(),
            book_dump: false,
        }
    }
}
