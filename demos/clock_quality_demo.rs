//! Simulated Milan certification run.
//!
//! Feeds a converging clock into a Milan session, prints the compliance
//! report and hands the TLV snapshot to an Automotive session.
//!
//! Run with `RUST_LOG=debug cargo run --example clock_quality_demo` for
//! recorder logs. `GPTP_CLOCK_QUALITY_METHOD` and friends override the
//! recorder configuration.

use std::sync::Arc;

use gptp_clock_quality::{
    ClockQualityConfig, ComplianceProfile, ProfileKind, ProfileSession, Result,
};
use tracing_subscriber::EnvFilter;

const T0: u64 = 1_000_000_000;
const SYNC_INTERVAL_NS: u64 = 125_000_000;
const PATH_DELAY_NS: u64 = 3_800;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = ClockQualityConfig::default();
    config.apply_env_overrides()?;

    let milan = ProfileSession::with_config(Arc::new(ComplianceProfile::milan()), &config)?;
    milan.enable_monitoring();

    // PDelay: two clean exchanges qualify the port
    for seq in 0..2u16 {
        let t1 = T0 + u64::from(seq) * 1_000_000_000;
        let t2 = t1 + 4_000;
        let t3 = t2 + 5_000;
        let t4 = t1 + 2 * PATH_DELAY_NS + 5_000;
        milan.record_pdelay_exchange(t1, t2, t3, t4);
        milan.record_pdelay_sequence(seq, t1, t1 + 6_000_000);
    }
    milan.record_neighbor_prop_delay(PATH_DELAY_NS);

    // Sync: 2 s of convergence, then 78 s of residual jitter
    for i in 0..640u64 {
        let master_tx = T0 + i * SYNC_INTERVAL_NS;
        #[allow(clippy::cast_possible_wrap)]
        let error: i64 = if i < 16 {
            400 - i as i64 * 20
        } else {
            (i % 7) as i64 * 6 - 18
        };
        let slave_rx = (master_tx + PATH_DELAY_NS).saturating_add_signed(error);
        milan.record_sync_ingress(master_tx, slave_rx, PATH_DELAY_NS);
    }

    println!("{}", milan.generate_compliance_report());
    println!();
    println!("Milan compliant:      {}", milan.validate_milan_requirements());
    println!("Automotive compliant: {}", milan.validate_automotive_requirements());

    let tlv = milan.export_clock_quality_tlv();
    println!("Exported {} byte clock quality TLV", tlv.len());

    let automotive = ProfileSession::preset(ProfileKind::Automotive);
    let imported = automotive.import_clock_quality_tlv(&tlv)?;
    println!(
        "Automotive session imported snapshot: mean {} ns, locked {}, method {}",
        imported.mean_time_error_ns, imported.is_locked, imported.measurement_method
    );

    Ok(())
}
