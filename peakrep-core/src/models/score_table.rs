use crate::errors::PeakRepError;

const P_VALUES: &str = "p-value";
const Q_VALUES: &str = "q-value";

///
/// Per-replicate raw p-value and q-value columns, aligned to window order.
///
/// Each column is written exactly once by the stage that owns it and is
/// never reset within a run.
///
#[derive(Debug, Clone)]
pub struct ScoreTable {
    n_windows: usize,
    p_values: Vec<Option<Vec<f64>>>,
    q_values: Vec<Option<Vec<f64>>>,
}

impl ScoreTable {
    pub fn new(n_replicates: usize, n_windows: usize) -> Self {
        ScoreTable {
            n_windows,
            p_values: vec![None; n_replicates],
            q_values: vec![None; n_replicates],
        }
    }

    pub fn n_windows(&self) -> usize {
        self.n_windows
    }

    pub fn n_replicates(&self) -> usize {
        self.p_values.len()
    }

    pub fn set_p_values(&mut self, replicate: usize, values: Vec<f64>) -> Result<(), PeakRepError> {
        write_once(&mut self.p_values, P_VALUES, replicate, self.n_windows, values)
    }

    pub fn set_q_values(&mut self, replicate: usize, values: Vec<f64>) -> Result<(), PeakRepError> {
        write_once(&mut self.q_values, Q_VALUES, replicate, self.n_windows, values)
    }

    pub fn p_values(&self, replicate: usize) -> Result<&[f64], PeakRepError> {
        read(&self.p_values, P_VALUES, replicate)
    }

    pub fn q_values(&self, replicate: usize) -> Result<&[f64], PeakRepError> {
        read(&self.q_values, Q_VALUES, replicate)
    }
}

fn write_once(
    columns: &mut [Option<Vec<f64>>],
    kind: &'static str,
    replicate: usize,
    n_windows: usize,
    values: Vec<f64>,
) -> Result<(), PeakRepError> {
    if values.len() != n_windows {
        return Err(PeakRepError::InvalidParameter(format!(
            "{} column has {} values, expected {}",
            kind,
            values.len(),
            n_windows
        )));
    }

    let slot = columns
        .get_mut(replicate)
        .ok_or(PeakRepError::InvalidReplicateOrdinal(replicate))?;
    if slot.is_some() {
        return Err(PeakRepError::SlotAlreadyWritten { kind, replicate });
    }
    *slot = Some(values);
    Ok(())
}

fn read<'a>(
    columns: &'a [Option<Vec<f64>>],
    kind: &'static str,
    replicate: usize,
) -> Result<&'a [f64], PeakRepError> {
    columns
        .get(replicate)
        .ok_or(PeakRepError::InvalidReplicateOrdinal(replicate))?
        .as_deref()
        .ok_or(PeakRepError::SlotUnset { kind, replicate })
}
