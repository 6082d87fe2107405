use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rate_node::conversion::{format_rate_label, format_update_time};
use rate_node::delivery::DeliveryEstimate;
use rate_node::{ConversionTable, RateAcquisitionController, RateBoard};
use std::path::PathBuf;
use tokio::time::{interval, sleep, Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;
use twd_fx_common::{ConverterConfig, Currency};

#[derive(Parser)]
#[command(name = "rate-node")]
#[command(about = "TWD 환율 환산 및 납기 계산 도구")]
struct Cli {
    /// 설정 파일 (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 최신 환율을 한 번 가져와서 출력
    Rates,

    /// 금액을 모든 통화로 환산
    Convert {
        /// 통화 코드 (TWD, USD, JPY, CNY)
        currency: Currency,

        /// 금액
        amount: String,

        /// 환율 API를 호출하지 않고 기본 환율 사용
        #[arg(long)]
        offline: bool,
    },

    /// 시작 지연 후 환율을 가져오고, 주기적으로 갱신
    Watch {
        /// 갱신 주기 (초). 없으면 한 번만 실행
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// 납기 계산
    Delivery {
        /// 기준일 (기본: 오늘)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// 납기일
        #[arg(long, conflicts_with = "days")]
        to: Option<NaiveDate>,

        /// 기준일로부터 일수
        #[arg(long, allow_hyphen_values = true)]
        days: Option<i64>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<ConverterConfig> {
    match path {
        Some(path) => ConverterConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(ConverterConfig::default()),
    }
}

fn setup(path: Option<&PathBuf>) -> Result<(ConverterConfig, RateAcquisitionController)> {
    let config = load_config(path)?;
    let controller = RateAcquisitionController::from_config(&config)?;
    info!(
        "Rate node ready with {} sources",
        controller.registry().len()
    );
    Ok((config, controller))
}

fn print_board(board: &RateBoard) {
    for (currency, rate) in board.rates.iter() {
        println!("  {}", format_rate_label(currency, rate));
    }

    let updated = board
        .last_update
        .map(format_update_time)
        .unwrap_or_else(|| "-".to_string());
    println!("  updated: {} ({})", updated, board.data_source);
}

fn print_table(table: &ConversionTable) {
    for (currency, _) in table.iter() {
        let marker = if currency == table.input.currency { "*" } else { " " };
        println!("{} {} {:>16}", marker, currency, table.formatted(currency));
    }
}

async fn run_convert(
    controller: &RateAcquisitionController,
    currency: Currency,
    amount: &str,
    offline: bool,
) -> Result<()> {
    if controller.set_input(currency, amount).await.is_none() {
        anyhow::bail!("Invalid amount: {:?}", amount);
    }

    if !offline {
        controller.acquire().await;
    }

    let board = controller.snapshot().await;
    if let Some(table) = &board.conversion {
        print_table(table);
    }
    print_board(&board);
    Ok(())
}

async fn run_watch(
    controller: &RateAcquisitionController,
    config: &ConverterConfig,
    every: Option<u64>,
) -> Result<()> {
    sleep(config.startup_delay()).await;

    let Some(every) = every else {
        controller.acquire().await;
        print_board(&controller.snapshot().await);
        return Ok(());
    };

    let mut ticker = interval(Duration::from_secs(every.max(1)));
    loop {
        ticker.tick().await;
        if controller.acquire().await.is_some() {
            print_board(&controller.snapshot().await);
        }
    }
}

fn run_delivery(from: Option<NaiveDate>, to: Option<NaiveDate>, days: Option<i64>) -> Result<()> {
    let today = from.unwrap_or_else(|| chrono::Local::now().date_naive());

    let estimate = match (to, days) {
        (Some(to), _) => DeliveryEstimate::from_dates(today, to),
        (None, Some(days)) => DeliveryEstimate::from_days(today, days)?,
        (None, None) => anyhow::bail!("Either --to or --days is required"),
    };

    println!("today:     {}", estimate.today);
    println!("delivery:  {}", estimate.delivery);
    println!("days:      {}", estimate.days);
    println!("work days: {}", estimate.work_days);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Delivery { from, to, days } => run_delivery(from, to, days)?,
        Commands::Rates => {
            let (_, controller) = setup(cli.config.as_ref())?;
            controller.acquire().await;
            print_board(&controller.snapshot().await);
        }
        Commands::Convert {
            currency,
            amount,
            offline,
        } => {
            let (_, controller) = setup(cli.config.as_ref())?;
            run_convert(&controller, currency, &amount, offline).await?;
        }
        Commands::Watch { interval } => {
            let (config, controller) = setup(cli.config.as_ref())?;
            run_watch(&controller, &config, interval).await?;
        }
    }

    Ok(())
}
