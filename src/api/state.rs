use crate::core::AppConfig;
use crate::notify::{PushSender, SubscriptionStore};
use crate::qstash::QstashClient;

pub struct AppState {
    // The browser subscription from the last subscribe call
    pub subscriptions: SubscriptionStore,
    pub push: PushSender,
    // Only present when a QStash token is configured
    pub qstash: Option<QstashClient>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let client = reqwest::Client::new();
        let push = PushSender::new(client.clone(), config.vapid.clone(), &config.vapid_contact);
        let qstash = config
            .qstash_token
            .as_deref()
            .map(|token| QstashClient::new(client, &config.qstash_url, token));

        Self {
            subscriptions: SubscriptionStore::default(),
            push,
            qstash,
            config,
        }
    }
}
