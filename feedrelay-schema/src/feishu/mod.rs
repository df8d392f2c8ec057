mod card;

pub use card::{CardElement, CardHeader, CardText, FeishuCard, FeishuCardMessage};
