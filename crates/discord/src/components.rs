use serde::{ser::SerializeStruct, Serialize, Serializer};

pub const TICKET_FORM_ID: &str = "ticketModal";
pub const SUBJECT_FIELD: &str = "subject";
pub const DESCRIPTION_FIELD: &str = "description";

const ACTION_ROW_TYPE: u8 = 1;
const TEXT_INPUT_TYPE: u8 = 4;
const EPHEMERAL_FLAG: u64 = 1 << 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextInputStyle {
    Short,
    Paragraph,
}

impl TextInputStyle {
    fn code(&self) -> u8 {
        match self {
            Self::Short => 1,
            Self::Paragraph => 2,
        }
    }
}

impl Serialize for TextInputStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextInput {
    #[serde(rename = "type")]
    kind: u8,
    pub custom_id: String,
    pub label: String,
    pub style: TextInputStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub required: bool,
}

impl TextInput {
    pub fn new(
        custom_id: impl Into<String>,
        label: impl Into<String>,
        style: TextInputStyle,
    ) -> Self {
        Self {
            kind: TEXT_INPUT_TYPE,
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            placeholder: None,
            required: false,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    kind: u8,
    pub components: Vec<TextInput>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub components: Vec<ActionRow>,
}

pub struct ModalBuilder {
    custom_id: String,
    title: String,
    rows: Vec<ActionRow>,
}

impl ModalBuilder {
    pub fn new(custom_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { custom_id: custom_id.into(), title: title.into(), rows: Vec::new() }
    }

    /// Adds a text input on its own row; Discord allows one text input per row.
    pub fn text_input(mut self, input: TextInput) -> Self {
        self.rows.push(ActionRow { kind: ACTION_ROW_TYPE, components: vec![input] });
        self
    }

    pub fn build(self) -> Modal {
        Modal { custom_id: self.custom_id, title: self.title, components: self.rows }
    }
}

/// What the bot sends back for a single interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionResponse {
    Pong,
    Modal(Modal),
    Message { content: String, ephemeral: bool },
}

impl InteractionResponse {
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self::Message { content: content.into(), ephemeral: true }
    }

    pub fn callback_type(&self) -> u8 {
        match self {
            Self::Pong => 1,
            Self::Message { .. } => 4,
            Self::Modal(_) => 9,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Message { content, .. } => Some(content),
            Self::Pong | Self::Modal(_) => None,
        }
    }
}

#[derive(Serialize)]
struct MessageData<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<u64>,
}

impl Serialize for InteractionResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let field_count = if matches!(self, Self::Pong) { 1 } else { 2 };
        let mut state = serializer.serialize_struct("InteractionResponse", field_count)?;
        state.serialize_field("type", &self.callback_type())?;
        match self {
            Self::Pong => {}
            Self::Modal(modal) => state.serialize_field("data", modal)?,
            Self::Message { content, ephemeral } => {
                let data = MessageData {
                    content: content.as_str(),
                    flags: ephemeral.then_some(EPHEMERAL_FLAG),
                };
                state.serialize_field("data", &data)?
            }
        }
        state.end()
    }
}

pub fn ticket_form_modal() -> Modal {
    ModalBuilder::new(TICKET_FORM_ID, "Create a Ticket")
        .text_input(
            TextInput::new(SUBJECT_FIELD, "Subject", TextInputStyle::Short)
                .placeholder("Enter ticket subject")
                .required(),
        )
        .text_input(
            TextInput::new(DESCRIPTION_FIELD, "Description", TextInputStyle::Paragraph)
                .placeholder("Describe the issue")
                .required(),
        )
        .build()
}

pub fn ticket_created_message(ticket_id: &str) -> InteractionResponse {
    InteractionResponse::ephemeral(format!(
        "✅ Ticket created successfully in HubSpot! Your ticket number is **{ticket_id}**."
    ))
}
