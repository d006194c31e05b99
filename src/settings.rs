/// Options shared by every block and group resolution of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveSettings {
    include_padding: bool,
    include_sysex: bool,
    truncate_name: bool,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        ResolveSettings {
            include_padding: false,
            include_sysex: true,
            truncate_name: false,
        }
    }
}

impl ResolveSettings {
    pub fn new() -> Self {
        ResolveSettings::default()
    }

    /// Emit `PADDINGn` entries for reserved regions.
    /// Padding always consumes byte offsets, this only controls whether the entries are kept.
    pub fn include_padding(mut self, include_padding: bool) -> Self {
        self.include_padding = include_padding;
        self
    }

    /// Compute and attach the SysEx (wire) offsets and lengths.
    pub fn include_sysex(mut self, include_sysex: bool) -> Self {
        self.include_sysex = include_sysex;
        self
    }

    /// Only keep the first item of expanded parameter arrays.
    /// The hidden items still reserve their address space.
    pub fn truncate_name(mut self, truncate_name: bool) -> Self {
        self.truncate_name = truncate_name;
        self
    }

    pub fn should_include_padding(&self) -> bool {
        self.include_padding
    }

    pub fn should_include_sysex(&self) -> bool {
        self.include_sysex
    }

    pub fn should_truncate_name(&self) -> bool {
        self.truncate_name
    }
}
