/// Inputs of one transformation run, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformContext {
    pub source_namespace: String,
    pub dest_namespace: String,
    /// Name of the VM, kept as is in the destination.
    pub name: String,
    /// Keep `macAddress` fields on the clone. The source VM's addresses then have to be changed
    /// by hand before the clone is started.
    pub preserve_mac: bool,
}

impl TransformContext {
    pub fn clone_into<S, D, N>(source_namespace: S, dest_namespace: D, name: N) -> Self
    where
        S: Into<String>,
        D: Into<String>,
        N: Into<String>,
    {
        TransformContext {
            source_namespace: source_namespace.into(),
            dest_namespace: dest_namespace.into(),
            name: name.into(),
            preserve_mac: false,
        }
    }

    /// Context for editing a VM where it is, source and destination are the same namespace.
    pub fn in_place<S, N>(namespace: S, name: N) -> Self
    where
        S: Into<String>,
        N: Into<String>,
    {
        let namespace = namespace.into();

        TransformContext {
            dest_namespace: namespace.clone(),
            source_namespace: namespace,
            name: name.into(),
            preserve_mac: true,
        }
    }

    pub fn preserve_mac(mut self, preserve_mac: bool) -> Self {
        self.preserve_mac = preserve_mac;
        self
    }
}
