//! Table accessors for the properties schema.
//!
//! Written in the shape `flatc --rust` emits, so the layout stays readable
//! by every flatbuffers runtime:
//!
//! ```text
//! table PropertiesModel {
//!     is_in_memory: bool = false;
//!     is_editable: bool = true;
//!     settings: SettingsModel;
//! }
//!
//! table SettingsModel {
//!     title: string;
//!     subject: string;
//!     description: string;
//!     tags: string;
//!     category: string;
//!     creator: string;
//! }
//! ```
//!
//! Fields are append-only. A new field takes the next vtable offset and an
//! existing offset is never reused.

use flatbuffers::{
    FlatBufferBuilder, Follow, ForwardsUOffset, InvalidFlatbuffer, Table, TableFinishedWIPOffset,
    VOffsetT, Verifiable, Verifier, WIPOffset,
};

use super::model::{CoreProperties, DEFAULT_IS_EDITABLE, DEFAULT_IS_IN_MEMORY};

/// Root table of a properties buffer.
#[derive(Copy, Clone, PartialEq)]
pub struct PropertiesModel<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for PropertiesModel<'a> {
    type Inner = PropertiesModel<'a>;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: unsafe { Table::new(buf, loc) },
        }
    }
}

impl<'a> PropertiesModel<'a> {
    pub const VT_IS_IN_MEMORY: VOffsetT = 4;
    pub const VT_IS_EDITABLE: VOffsetT = 6;
    pub const VT_SETTINGS: VOffsetT = 8;

    /// Fields this version of the schema knows about.
    pub const FIELD_COUNT: usize = 3;

    #[inline]
    pub fn is_in_memory(&self) -> bool {
        // Safety: created from a verified buffer
        unsafe { self._tab.get::<bool>(Self::VT_IS_IN_MEMORY, Some(DEFAULT_IS_IN_MEMORY)) }
            .unwrap_or(DEFAULT_IS_IN_MEMORY)
    }

    #[inline]
    pub fn is_editable(&self) -> bool {
        // Safety: created from a verified buffer
        unsafe { self._tab.get::<bool>(Self::VT_IS_EDITABLE, Some(DEFAULT_IS_EDITABLE)) }
            .unwrap_or(DEFAULT_IS_EDITABLE)
    }

    #[inline]
    pub fn settings(&self) -> Option<SettingsModel<'a>> {
        // Safety: created from a verified buffer
        unsafe {
            self._tab
                .get::<ForwardsUOffset<SettingsModel<'a>>>(Self::VT_SETTINGS, None)
        }
    }

    /// Number of fields the writer's vtable declares.
    pub fn field_count(&self) -> usize {
        self._tab.vtable().num_fields()
    }
}

impl Verifiable for PropertiesModel<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<bool>("is_in_memory", Self::VT_IS_IN_MEMORY, false)?
            .visit_field::<bool>("is_editable", Self::VT_IS_EDITABLE, false)?
            .visit_field::<ForwardsUOffset<SettingsModel>>("settings", Self::VT_SETTINGS, false)?
            .finish();
        Ok(())
    }
}

/// Nested table holding the core (package) properties.
#[derive(Copy, Clone, PartialEq)]
pub struct SettingsModel<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for SettingsModel<'a> {
    type Inner = SettingsModel<'a>;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: unsafe { Table::new(buf, loc) },
        }
    }
}

impl<'a> SettingsModel<'a> {
    pub const VT_TITLE: VOffsetT = 4;
    pub const VT_SUBJECT: VOffsetT = 6;
    pub const VT_DESCRIPTION: VOffsetT = 8;
    pub const VT_TAGS: VOffsetT = 10;
    pub const VT_CATEGORY: VOffsetT = 12;
    pub const VT_CREATOR: VOffsetT = 14;

    pub const FIELD_COUNT: usize = 6;

    #[inline]
    fn text(&self, field: VOffsetT) -> Option<&'a str> {
        // Safety: created from a verified buffer
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(field, None) }
    }

    pub fn title(&self) -> Option<&'a str> {
        self.text(Self::VT_TITLE)
    }

    pub fn subject(&self) -> Option<&'a str> {
        self.text(Self::VT_SUBJECT)
    }

    pub fn description(&self) -> Option<&'a str> {
        self.text(Self::VT_DESCRIPTION)
    }

    pub fn tags(&self) -> Option<&'a str> {
        self.text(Self::VT_TAGS)
    }

    pub fn category(&self) -> Option<&'a str> {
        self.text(Self::VT_CATEGORY)
    }

    pub fn creator(&self) -> Option<&'a str> {
        self.text(Self::VT_CREATOR)
    }

    pub fn field_count(&self) -> usize {
        self._tab.vtable().num_fields()
    }

    pub fn to_core(&self) -> CoreProperties {
        let owned = |text: Option<&str>| text.map(str::to_owned);
        CoreProperties {
            title: owned(self.title()),
            subject: owned(self.subject()),
            description: owned(self.description()),
            tags: owned(self.tags()),
            category: owned(self.category()),
            creator: owned(self.creator()),
        }
    }
}

impl Verifiable for SettingsModel<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("title", Self::VT_TITLE, false)?
            .visit_field::<ForwardsUOffset<&str>>("subject", Self::VT_SUBJECT, false)?
            .visit_field::<ForwardsUOffset<&str>>("description", Self::VT_DESCRIPTION, false)?
            .visit_field::<ForwardsUOffset<&str>>("tags", Self::VT_TAGS, false)?
            .visit_field::<ForwardsUOffset<&str>>("category", Self::VT_CATEGORY, false)?
            .visit_field::<ForwardsUOffset<&str>>("creator", Self::VT_CREATOR, false)?
            .finish();
        Ok(())
    }
}

/// Write the settings table. Strings must be created before the table is
/// started, so they are pushed first.
pub fn create_settings<'fbb>(
    fbb: &mut FlatBufferBuilder<'fbb>,
    core: &CoreProperties,
) -> WIPOffset<TableFinishedWIPOffset> {
    let mut text = |value: &Option<String>| value.as_deref().map(|s| fbb.create_string(s));
    let title = text(&core.title);
    let subject = text(&core.subject);
    let description = text(&core.description);
    let tags = text(&core.tags);
    let category = text(&core.category);
    let creator = text(&core.creator);

    let start = fbb.start_table();
    let fields = [
        (SettingsModel::VT_TITLE, title),
        (SettingsModel::VT_SUBJECT, subject),
        (SettingsModel::VT_DESCRIPTION, description),
        (SettingsModel::VT_TAGS, tags),
        (SettingsModel::VT_CATEGORY, category),
        (SettingsModel::VT_CREATOR, creator),
    ];
    for (field, offset) in fields {
        if let Some(offset) = offset {
            fbb.push_slot_always::<WIPOffset<_>>(field, offset);
        }
    }
    fbb.end_table(start)
}

/// Write the root table. Values equal to their defaults are left out.
pub fn create_properties<'fbb>(
    fbb: &mut FlatBufferBuilder<'fbb>,
    is_in_memory: bool,
    is_editable: bool,
    settings: Option<WIPOffset<TableFinishedWIPOffset>>,
) -> WIPOffset<TableFinishedWIPOffset> {
    let start = fbb.start_table();
    if let Some(settings) = settings {
        fbb.push_slot_always::<WIPOffset<_>>(PropertiesModel::VT_SETTINGS, settings);
    }
    fbb.push_slot::<bool>(PropertiesModel::VT_IS_EDITABLE, is_editable, DEFAULT_IS_EDITABLE);
    fbb.push_slot::<bool>(PropertiesModel::VT_IS_IN_MEMORY, is_in_memory, DEFAULT_IS_IN_MEMORY);
    fbb.end_table(start)
}
