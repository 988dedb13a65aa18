use anyhow::Result;
use clap::Parser;
use vitrine_engine::device::DeviceConfig;
use vitrine_engine::logging::{init_logging, LoggingConfig};
use vitrine_engine::window::{Runtime, RuntimeConfig};

mod demos;
mod gallery;

use demos::Demo;
use gallery::Gallery;

/// Small 3D demos, one window per card, all drawn by one shared GPU device.
#[derive(Debug, Parser)]
#[command(name = "vitrine-gallery", version)]
struct Args {
    /// Which demo to open.
    #[arg(long, value_enum, default_value_t = Demo::Multiple)]
    demo: Demo,

    /// Number of cards opened by the `multiple` demo.
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..=50))]
    cards: u32,

    /// Seed for the random geometry/color picks; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Render without MSAA.
    #[arg(long)]
    no_antialias: bool,

    /// Log filter in `env_logger` syntax (overrides RUST_LOG).
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(match &args.log {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    });

    let cards = demos::cards(args.demo, args.cards as usize, args.seed);
    log::info!("opening {:?} demo with {} card(s)", args.demo, cards.len());

    let device = DeviceConfig {
        antialias: !args.no_antialias,
        ..DeviceConfig::default()
    };

    Runtime::run(RuntimeConfig::default(), device, Gallery::new(cards))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_open_the_cards_demo() {
        let args = Args::try_parse_from(["vitrine-gallery"]).unwrap();
        assert_eq!(args.demo, Demo::Multiple);
        assert_eq!(args.cards, 12);
        assert!(!args.no_antialias);
    }

    #[test]
    fn demo_names_are_kebab_case() {
        let args = Args::try_parse_from(["vitrine-gallery", "--demo", "post-process", "--seed", "7"]).unwrap();
        assert_eq!(args.demo, Demo::PostProcess);
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn material_demo_is_selectable() {
        let args = Args::try_parse_from(["vitrine-gallery", "--demo", "material"]).unwrap();
        assert_eq!(args.demo, Demo::Material);
    }

    #[test]
    fn card_count_is_bounded() {
        assert!(Args::try_parse_from(["vitrine-gallery", "--cards", "0"]).is_err());
        assert!(Args::try_parse_from(["vitrine-gallery", "--cards", "51"]).is_err());
    }
}
