use serde::{Deserialize, Serialize};

/// Interactive card message accepted by Feishu custom-bot webhooks.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FeishuCardMessage {
    pub msg_type: String,
    pub card: FeishuCard,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FeishuCard {
    pub header: CardHeader,
    pub elements: Vec<CardElement>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CardHeader {
    pub title: CardText,
    pub template: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CardElement {
    pub tag: String,
    pub text: CardText,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CardText {
    pub tag: String,
    pub content: String,
}

impl CardText {
    fn plain(content: impl Into<String>) -> Self {
        Self {
            tag: "plain_text".to_string(),
            content: content.into(),
        }
    }

    fn markdown(content: impl Into<String>) -> Self {
        Self {
            tag: "lark_md".to_string(),
            content: content.into(),
        }
    }
}

impl FeishuCardMessage {
    /// Red alert card: a plain-text header, a markdown body, and a timestamp line.
    pub fn alert(title: &str, body: &str, timestamp: &str) -> Self {
        Self {
            msg_type: "interactive".to_string(),
            card: FeishuCard {
                header: CardHeader {
                    title: CardText::plain(title),
                    template: "red".to_string(),
                },
                elements: vec![
                    CardElement {
                        tag: "div".to_string(),
                        text: CardText::markdown(body),
                    },
                    CardElement {
                        tag: "div".to_string(),
                        text: CardText::plain(format!("Time: {timestamp}")),
                    },
                ],
            },
        }
    }
}
