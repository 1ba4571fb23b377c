/// Outcome of a synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Members whose shares were re-encrypted and saved
    pub updated: usize,
    /// Members with nothing to update
    pub skipped: usize,
}
