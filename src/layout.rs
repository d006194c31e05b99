use crate::constants::ConstantTable;
use crate::err::{LayoutError, Result};
use crate::model::{BlockRegistry, GroupRegistry, Layout};
use crate::resolver::{ResolveContext, resolve_block, resolve_group};
use crate::schema::SchemaDocument;
use crate::settings::ResolveSettings;

use log::{debug, info};

#[derive(Debug, Clone)]
struct Import {
    document: SchemaDocument,
    blocks: Vec<String>,
    groups: Vec<String>,
}

/// Resolves the requested blocks and groups of one or more schema documents into a [`Layout`].
///
/// Constants from every imported document are loaded before anything is resolved. Blocks and
/// groups are then resolved import by import, in the order they were requested, so a group can
/// place any block requested earlier (by its own or a previous import).
///
/// ```
/// # use parammap::{LayoutBuilder, ResolveSettings, SchemaDocument};
/// let doc = SchemaDocument::parse(r#"
///     <zen>
///       <baseblock name="HDR"><param id="A" min="0" max="127"/></baseblock>
///       <group name="ALL"><block baseblock="HDR" array="2"/></group>
///     </zen>"#).unwrap();
///
/// let layout = LayoutBuilder::new(ResolveSettings::new())
///     .import(doc, ["HDR"], ["ALL"])
///     .build()
///     .unwrap();
///
/// assert_eq!(layout.groups().get("ALL").unwrap().total_byte_length, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutBuilder {
    settings: ResolveSettings,
    imports: Vec<Import>,
}

impl LayoutBuilder {
    pub fn new(settings: ResolveSettings) -> Self {
        LayoutBuilder {
            settings,
            imports: Vec::new(),
        }
    }

    pub fn settings(&self) -> ResolveSettings {
        self.settings
    }

    /// Requests `blocks` and `groups` from `document`.
    pub fn import<B, G>(mut self, document: SchemaDocument, blocks: B, groups: G) -> Self
    where
        B: IntoIterator,
        B::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        self.imports.push(Import {
            document,
            blocks: blocks.into_iter().map(Into::into).collect(),
            groups: groups.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Requests every block and group declared in `document`, in document order.
    pub fn import_all(self, document: SchemaDocument) -> Self {
        let blocks: Vec<String> = document.blocks().map(|b| b.name.clone()).collect();
        let groups: Vec<String> = document.groups().map(|g| g.name.clone()).collect();
        self.import(document, blocks, groups)
    }

    pub fn build(&self) -> Result<Layout> {
        let constants = self.load_constants()?;
        let ctx = ResolveContext::new(&constants, self.settings);

        let mut blocks = BlockRegistry::new();
        let mut groups = GroupRegistry::new();

        for import in &self.imports {
            for name in &import.blocks {
                let decl = import.document.block(name)?;
                // Also catches a block requested twice.
                if blocks.contains(&decl.name) {
                    return Err(LayoutError::DuplicateBlock {
                        name: decl.name.clone(),
                    });
                }

                debug!("resolving {:?} `{}`", decl.kind, decl.name);
                let block =
                    resolve_block(&decl.items, &decl.name, &decl.description, &mut blocks, &ctx)?;
                blocks.register(block)?;
            }

            for name in &import.groups {
                let decl = import.document.group(name)?;
                groups.register(resolve_group(&decl.items, &decl.name, &blocks, &ctx)?)?;
            }
        }

        info!(
            "layout resolved: {} blocks, {} groups",
            blocks.len(),
            groups.len()
        );

        Layout::new(blocks, groups)
    }

    fn load_constants(&self) -> Result<ConstantTable> {
        let mut constants = ConstantTable::new();

        for numdef in self.imports.iter().flat_map(|i| i.document.numdefs()) {
            let value =
                numdef
                    .num
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| LayoutError::InvalidNumber {
                        entity: numdef.name.clone(),
                        attribute: "num",
                        value: numdef.num.clone(),
                    })?;
            constants.set(&numdef.name, value)?;
        }

        Ok(constants)
    }
}
