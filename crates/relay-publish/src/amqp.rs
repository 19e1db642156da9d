use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions};
use lapin::publisher_confirm::Confirmation;
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use relay_types::Block;

use crate::broker::BrokerConfig;
use crate::error::{PublishError, PublishResult};
use crate::traits::Republisher;

/// Persistent delivery, so a broker restart does not lose queued blocks.
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Publishes blocks to an AMQP 0-9-1 exchange with publisher confirms.
///
/// Every publish is `mandatory`, so a block the exchange cannot route comes
/// back as a rejection instead of vanishing. One publish is in flight at a
/// time; the next waits on the lock until the previous one is confirmed.
///
/// As with [`BrokerPublisher`](crate::BrokerPublisher), the first failure
/// drops the connection and every later publish reports
/// [`PublishError::ConnectionLost`].
pub struct AmqpPublisher {
    config: BrokerConfig,
    link: Mutex<Option<Link>>,
}

struct Link {
    // Held so the connection outlives the channel.
    _conn: Connection,
    channel: Channel,
}

impl AmqpPublisher {
    /// Open a connection and a confirm-mode channel.
    ///
    /// Gives up with [`PublishError::ConnectionLost`] if the broker has not
    /// completed the handshake within the publish timeout.
    pub async fn connect(config: BrokerConfig) -> PublishResult<Self> {
        config.validate()?;
        let address = config.address();
        let limit = config.publish_timeout();
        let link = tokio::time::timeout(limit, open_link(&config))
            .await
            .map_err(|_| {
                PublishError::ConnectionLost(format!("connect {address}: no handshake within {limit:?}"))
            })?
            .map_err(|e| PublishError::ConnectionLost(format!("connect {address}: {e}")))?;
        info!(
            broker = %address,
            vhost = %config.vhost,
            exchange = %config.exchange,
            routing_key = %config.routing_key,
            "connected to AMQP broker"
        );
        Ok(Self {
            config,
            link: Mutex::new(Some(link)),
        })
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub async fn is_connected(&self) -> bool {
        self.link.lock().await.is_some()
    }
}

async fn open_link(config: &BrokerConfig) -> lapin::Result<Link> {
    let conn = Connection::connect(&config.amqp_uri(), ConnectionProperties::default()).await?;
    let channel = conn.create_channel().await?;
    channel
        .confirm_select(ConfirmSelectOptions::default())
        .await?;
    Ok(Link {
        _conn: conn,
        channel,
    })
}

#[async_trait]
impl Republisher for AmqpPublisher {
    async fn publish(&self, block: &Block) -> PublishResult<()> {
        let mut guard = self.link.lock().await;
        let link = guard.as_ref().ok_or_else(|| {
            PublishError::ConnectionLost("connection dropped after an earlier failure".into())
        })?;

        let message_id = Uuid::now_v7();
        let limit = self.config.publish_timeout();
        let result = tokio::time::timeout(
            limit,
            confirm_publish(&link.channel, &self.config, message_id, block),
        )
        .await
        .unwrap_or(Err(PublishError::Timeout(limit)));

        match &result {
            Ok(()) => debug!(height = %block.height, %message_id, "broker confirmed block"),
            Err(error) => {
                warn!(height = %block.height, %message_id, %error, "publish failed; dropping AMQP connection");
                *guard = None;
            }
        }
        result
    }
}

async fn confirm_publish(
    channel: &Channel,
    config: &BrokerConfig,
    message_id: Uuid,
    block: &Block,
) -> PublishResult<()> {
    let height = block.height.get();
    let confirm = channel
        .basic_publish(
            &config.exchange,
            &config.routing_key,
            BasicPublishOptions {
                mandatory: true,
                ..Default::default()
            },
            &block.payload,
            properties(message_id, block),
        )
        .await
        .map_err(|e| lapin_error(e, height))?;
    let confirmation = confirm.await.map_err(|e| lapin_error(e, height))?;
    confirmation_outcome(confirmation, height)
}

fn properties(message_id: Uuid, block: &Block) -> BasicProperties {
    let mut headers = FieldTable::default();
    headers.insert(
        ShortString::from("height"),
        AMQPValue::LongString(block.height.to_string().into()),
    );
    BasicProperties::default()
        .with_message_id(ShortString::from(message_id.to_string()))
        .with_content_type(ShortString::from("application/octet-stream"))
        .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
        .with_headers(headers)
}

fn confirmation_outcome(confirmation: Confirmation, height: u64) -> PublishResult<()> {
    match confirmation {
        Confirmation::Ack(None) => Ok(()),
        Confirmation::Ack(Some(returned)) => Err(PublishError::Rejected {
            height,
            reason: format!(
                "unroutable ({} {})",
                returned.reply_code,
                returned.reply_text.as_str()
            ),
        }),
        Confirmation::Nack(_) => Err(PublishError::Rejected {
            height,
            reason: "broker nacked the publish".into(),
        }),
        Confirmation::NotRequested => Err(PublishError::Protocol(
            "channel is not in confirm mode".into(),
        )),
    }
}

/// Transport faults and closed channels mean the link is gone; a channel
/// closed by the broker over this publish (missing exchange, access refused)
/// is a rejection of the block.
fn lapin_error(error: lapin::Error, height: u64) -> PublishError {
    match error {
        lapin::Error::IOError(e) => PublishError::ConnectionLost(e.to_string()),
        lapin::Error::InvalidConnectionState(state) => {
            PublishError::ConnectionLost(format!("connection is {state:?}"))
        }
        lapin::Error::InvalidChannelState(state) => {
            PublishError::ConnectionLost(format!("channel is {state:?}"))
        }
        lapin::Error::ProtocolError(amqp) => PublishError::Rejected {
            height,
            reason: amqp.to_string(),
        },
        other => PublishError::Protocol(other.to_string()),
    }
}
