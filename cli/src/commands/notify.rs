use color_eyre::eyre::Result;

use crate::cli::Toggle;
use crate::engine::{remove_file, write_atomic, StatePaths};

pub fn run(state: Toggle) -> Result<()> {
    let marker = StatePaths::default().silent_file();

    match state {
        Toggle::On => {
            remove_file(&marker)?;
            println!("Notifications enabled.");
        }
        Toggle::Off => {
            write_atomic(&marker, "")?;
            println!("Notifications silenced ({}).", marker.display());
        }
    }

    Ok(())
}
