//! Longer operator hints, kept here so the wording is shared between the commands that print them.

/// Shown after a `DataVolume` is found in the `PendingPopulation` phase.
pub const PENDING_POPULATION_HINT: &str = "PendingPopulation indicates the import has not \
    started. You will need to start the VM to initiate the import process.";

/// Shown after a `DataVolume` is found in any phase other than `Succeeded` or
/// `PendingPopulation`.
pub const IMPORT_IN_PROGRESS_HINT: &str = "You may want to wait for the import to complete and \
    for the phase to change to Succeeded. Run `kubectl get datavolume` to see the PHASE and \
    PROGRESS of the imports in this namespace.";

/// Shown when cloning with `--preserve-mac`.
pub const PRESERVE_MAC_HINT: &str = "MAC addresses were kept on the cloned VM. The cluster will \
    not run two VMs with the same MAC address, change the MAC addresses of the source VM before \
    starting the clone.";

/// The question asked before converting a VM with unfinished imports.
pub const CONTINUE_PROMPT: &str = "Are you sure you want to continue?";
