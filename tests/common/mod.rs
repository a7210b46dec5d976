use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const OPS_HEADER: [&str; 10] = [
    "op", "account", "code", "stamp", "amount", "name", "reg_ref", "active", "doc_hash", "bloom",
];

/// Writes an ops file with one unit-price stamp and `payments` settlements
/// against it, payer funded to exactly cover them.
pub fn generate_ops_csv(path: &Path, payments: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(OPS_HEADER)?;
    let total = payments.to_string();
    wtr.write_record(["fund", "alice", "", "", total.as_str(), "", "", "", "", ""])?;
    wtr.write_record([
        "create-stamp",
        "",
        "S1",
        "",
        "1",
        "Unit Stamp",
        "PP-2021-57",
        "true",
        "",
        "",
    ])?;

    for i in 1..=payments {
        let code = format!("P{i}");
        let doc_hash = format!("hash{i}");
        let bloom = format!("bloom{i}");
        wtr.write_record([
            "pay",
            "alice",
            code.as_str(),
            "S1",
            "",
            "",
            "",
            "",
            doc_hash.as_str(),
            bloom.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
