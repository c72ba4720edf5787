//! # Teach CLI
//!
//! Command-line interface for master/slave servo teaching rigs.
//!
//! 每条命令都是 One-shot：加载配置 → 连接（模拟）示教台 → 执行 → 断开。
//!
//! ```bash
//! # 录制 10 秒并保存到槽位 3
//! teach-cli record --slot 3 --name wave --duration 10
//!
//! # 镜像，Ctrl-C 停止
//! teach-cli mirror
//!
//! # 以 1.5 倍速回放槽位 3
//! teach-cli play --slot 3 --speed 1.5
//!
//! # 查看动作库
//! teach-cli actions list
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod sim;
mod utils;

use commands::{
    ActionsCommand, ConfigCommand, MirrorCommand, PlayCommand, RecordCommand, TorqueCommand,
};
use teach_sdk::tools::DEFAULT_LIBRARY_FILE;
use teach_sdk::tools::config::DEFAULT_CONFIG_FILE;

/// Teach CLI - 主从示教台命令行工具
#[derive(Parser, Debug)]
#[command(name = "teach-cli")]
#[command(about = "Record, mirror and replay servo arm motion", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（JSON 或 TOML）
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// 动作库文件
    #[arg(short, long, global = true, default_value = DEFAULT_LIBRARY_FILE)]
    library: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 录制动作（拖动主臂）
    Record {
        #[command(flatten)]
        args: RecordCommand,
    },

    /// 镜像：从臂实时跟随主臂
    Mirror {
        #[command(flatten)]
        args: MirrorCommand,
    },

    /// 在从臂上回放已保存的动作
    Play {
        #[command(flatten)]
        args: PlayCommand,
    },

    /// 动作库管理
    #[command(subcommand)]
    Actions(ActionsCommand),

    /// 扭矩开关
    Torque {
        #[command(flatten)]
        args: TorqueCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// 命令共享的路径参数
#[derive(Debug, Clone)]
pub struct Paths {
    pub config: PathBuf,
    pub library: PathBuf,
}

fn main() -> Result<()> {
    // 初始化日志
    teach_sdk::init_logging();

    let cli = Cli::parse();
    let paths = Paths {
        config: cli.config,
        library: cli.library,
    };

    match cli.command {
        Commands::Record { args } => args.execute(&paths),
        Commands::Mirror { args } => args.execute(&paths),
        Commands::Play { args } => args.execute(&paths),
        Commands::Actions(cmd) => cmd.execute(&paths),
        Commands::Torque { args } => args.execute(&paths),
        Commands::Config(cmd) => cmd.execute(&paths),
    }
}
