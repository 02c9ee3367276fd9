use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::Result;
use crate::properties::FeatureStatsTable;
use crate::tuning::GridResult;

/// One row per resolution, one column per gain
pub fn write_grid_csv<P: AsRef<Path>>(result: &GridResult, output_path: P) -> Result<()> {
    let mut writer = Writer::from_writer(File::create(output_path)?);

    let mut header = vec!["resolution".to_string()];
    header.extend(result.gain_range.iter().map(|g| format!("gain_{}", g)));
    writer.write_record(&header)?;

    for (res, row) in result.res_range.iter().zip(result.matrix.outer_iter()) {
        let mut record = vec![res.to_string()];
        record.extend(row.iter().map(|v| format!("{:.6}", v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_stats_csv<P: AsRef<Path>>(table: &FeatureStatsTable, output_path: P) -> Result<()> {
    let mut writer = Writer::from_writer(File::create(output_path)?);

    let mut header = vec!["statistic".to_string()];
    header.extend(table.columns.iter().cloned());
    writer.write_record(&header)?;

    for (name, values) in table.rows.iter().zip(table.values.iter()) {
        let mut record = vec![name.clone()];
        record.extend(values.iter().map(|v| format!("{:.6}", v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, output_path: P) -> Result<()> {
    let writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}
