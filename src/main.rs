use clap::Parser;
use dutyreg::application::engine::DutyEngine;
use dutyreg::domain::identity::{AccountId, Credits};
use dutyreg::domain::payment::PayCode;
use dutyreg::domain::ports::{AccessControlBox, TokenLedgerBox};
use dutyreg::domain::stamp::StampCode;
use dutyreg::error::DutyError;
use dutyreg::infrastructure::in_memory::{InMemoryLedger, OwnerGate};
use dutyreg::interfaces::csv::op_reader::{OpKind, OpReader, OpRecord};
use dutyreg::interfaces::csv::report_writer::ReportWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Identity that receives settled duties and may mutate the catalog
    #[arg(long, default_value = "authority")]
    authority: String,

    /// Path to a persistent registry archive (optional). If provided, the
    /// registry state is reloaded from and saved back to RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let authority = AccountId::new(cli.authority.clone());

    let ledger = InMemoryLedger::new(authority.clone());
    let gate = OwnerGate::new(authority.clone(), ledger.pause_flag());
    let ledger_box: TokenLedgerBox = Box::new(ledger.clone());
    let access_box: AccessControlBox = Box::new(gate);

    #[cfg(feature = "storage-rocksdb")]
    let archive = match &cli.db_path {
        Some(path) => Some(
            dutyreg::infrastructure::rocksdb::RocksArchive::open(path).into_diagnostic()?,
        ),
        None => None,
    };

    #[cfg(feature = "storage-rocksdb")]
    let engine = match &archive {
        Some(archive) => {
            let snapshot = archive.load().into_diagnostic()?;
            DutyEngine::restore(ledger_box, access_box, snapshot).into_diagnostic()?
        }
        None => DutyEngine::new(ledger_box, access_box),
    };
    #[cfg(not(feature = "storage-rocksdb"))]
    let engine = DutyEngine::new(ledger_box, access_box);

    // Process operations
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = OpReader::new(file);
    for record in reader.operations() {
        match record {
            Ok(op) => {
                if let Err(e) = apply(&engine, &ledger, &authority, op).await {
                    eprintln!("Error processing operation: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {e}");
            }
        }
    }

    #[cfg(feature = "storage-rocksdb")]
    if let Some(archive) = &archive {
        archive.save(&engine.snapshot().await).into_diagnostic()?;
    }

    // Output final state
    let snapshot = engine.snapshot().await;
    let balances = ledger.balances().await;
    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    writer.write_report(&snapshot, &balances).into_diagnostic()?;

    Ok(())
}

async fn apply(
    engine: &DutyEngine,
    ledger: &InMemoryLedger,
    authority: &AccountId,
    op: OpRecord,
) -> dutyreg::error::Result<()> {
    match op.op {
        OpKind::Fund => {
            let account = AccountId::new(required(op.account, "account")?);
            let amount = Credits::new(op.amount.ok_or(DutyError::EmptyField("amount"))?);
            ledger.credit(&account, amount).await;
            Ok(())
        }
        OpKind::CreateStamp => {
            let caller = caller_or_authority(op.account, authority);
            let code = StampCode::parse(&required(op.code, "code")?)?;
            engine
                .create_stamp(
                    &caller,
                    code,
                    op.name.unwrap_or_default(),
                    Credits::new(op.amount.ok_or(DutyError::EmptyField("amount"))?),
                    op.reg_ref.unwrap_or_default(),
                    op.active.unwrap_or(true),
                )
                .await
        }
        OpKind::Activate => {
            let caller = caller_or_authority(op.account, authority);
            let code = StampCode::parse(&required(op.code, "code")?)?;
            engine.activate_stamp(&caller, &code).await
        }
        OpKind::Deactivate => {
            let caller = caller_or_authority(op.account, authority);
            let code = StampCode::parse(&required(op.code, "code")?)?;
            engine.deactivate_stamp(&caller, &code).await
        }
        OpKind::Pay => {
            let payer = AccountId::new(required(op.account, "account")?);
            let stamp = StampCode::parse(&required(op.stamp, "stamp")?)?;
            engine
                .create_payment(
                    &payer,
                    PayCode::new(op.code.unwrap_or_default()),
                    op.doc_hash.unwrap_or_default(),
                    stamp,
                    op.bloom.unwrap_or_default(),
                )
                .await
        }
    }
}

fn caller_or_authority(account: Option<String>, authority: &AccountId) -> AccountId {
    account
        .filter(|a| !a.is_empty())
        .map(AccountId::new)
        .unwrap_or_else(|| authority.clone())
}

fn required(field: Option<String>, name: &'static str) -> dutyreg::error::Result<String> {
    field
        .filter(|s| !s.is_empty())
        .ok_or(DutyError::EmptyField(name))
}
