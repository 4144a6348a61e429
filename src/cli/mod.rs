pub mod run;

use crate::config::Config;
use crate::models::App;

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}
