//! 动作库命令

use crate::Paths;
use crate::utils;
use anyhow::{Result, bail};
use clap::Subcommand;
use teach_sdk::prelude::*;
use teach_sdk::tools::timestamp;

/// 动作库命令
#[derive(Subcommand, Debug)]
pub enum ActionsCommand {
    /// 列出所有槽位
    List,

    /// 显示单个动作的路点
    Show {
        /// 槽位（1-10）
        slot: u8,
    },
}

impl ActionsCommand {
    pub fn execute(&self, paths: &Paths) -> Result<()> {
        let library = utils::load_library(&paths.library)?;
        match self {
            ActionsCommand::List => list(&library),
            ActionsCommand::Show { slot } => show(&library, Slot::new(*slot)?),
        }
    }
}

fn list(library: &ActionLibrary) -> Result<()> {
    println!("动作库 ({}/{} 已使用)", library.len(), Slot::all().count());
    for slot in Slot::all() {
        match library.get(slot) {
            Some(action) => println!(
                "  [{:>2}] {:<20} {:>5} 帧  {}",
                slot.get(),
                action.name,
                action.len(),
                action.created_at.as_ref().map(timestamp::format).unwrap_or_default()
            ),
            None => println!("  [{:>2}] -", slot.get()),
        }
    }
    Ok(())
}

fn show(library: &ActionLibrary, slot: Slot) -> Result<()> {
    let Some(action) = library.get(slot) else {
        bail!("Slot {} is empty", slot);
    };
    println!("[{}] {} ({} 帧)", slot, action.name, action.len());
    for (i, position) in action.positions.iter().enumerate() {
        println!("  {:>4}: {}", i, position);
    }
    Ok(())
}
