mod cmdline;
mod driver;

use takt_utils::TaktResult;

fn main() -> TaktResult<()> {
    driver::run_pipeline()
}
