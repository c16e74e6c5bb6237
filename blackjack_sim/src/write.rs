use crate::stats::{SimulationReport, SimulationSummary};
use crate::SimulationError;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::sync::mpsc::Receiver;

/// Receives worker summaries until every id in `ids` has sent its `None` end marker, then merges them
/// into one summary. Each worker's batches are merged in the order they were sent and workers in
/// ascending id order, so the result does not depend on thread scheduling.
pub fn collect_summaries(
    receiver: Receiver<(Option<SimulationSummary>, usize)>,
    mut ids: HashSet<usize>,
    mut total: SimulationSummary,
) -> Result<SimulationSummary, SimulationError> {
    let mut by_worker: BTreeMap<usize, Vec<SimulationSummary>> = BTreeMap::new();

    while !ids.is_empty() {
        match receiver.recv() {
            Ok((Some(summary), id)) => by_worker.entry(id).or_default().push(summary),
            Ok((None, id)) => {
                ids.remove(&id);
            }
            Err(e) => {
                return Err(SimulationError::SendingError(format!(
                    "{} worker(s) stopped without finishing: {}",
                    ids.len(),
                    e
                )))
            }
        }
    }

    for summary in by_worker.values().flatten() {
        total.merge(summary);
    }
    Ok(total)
}

/// Writes the text form of `report` to `writer`.
pub fn write_report(
    report: &SimulationReport,
    mut writer: impl Write,
) -> Result<(), SimulationError> {
    writer.write_all(report.to_string().as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Writes `report` as pretty printed JSON.
pub fn write_report_json(
    report: &SimulationReport,
    mut writer: impl Write,
) -> Result<(), SimulationError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
