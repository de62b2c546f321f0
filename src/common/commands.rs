/// Lệnh phiên chat gửi xuống tầng mạng.
#[derive(Debug, Clone)]
pub enum ClientCommand {
    /// Deliver one outgoing message over the persistent channel.
    SendMessage(String),
    /// Tear the connection down and stop the driver task.
    Shutdown,
}
