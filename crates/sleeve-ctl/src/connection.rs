use sleeve_proto::protocol::{Command, Frame, Message};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub struct DaemonConnection {
    stream: TcpStream,
    read_buffer: Vec<u8>,
}

impl DaemonConnection {
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await.map_err(|e| {
            anyhow::anyhow!("Could not reach sleeved at {}: {}", address, e)
        })?;
        Ok(Self {
            stream,
            read_buffer: Vec::with_capacity(4096),
        })
    }

    pub async fn send_command(&mut self, cmd: Command) -> anyhow::Result<()> {
        let encoded = Message::Command(cmd).encode()?;
        self.stream.write_all(&encoded).await?;
        Ok(())
    }

    /// Next complete frame from the daemon, or `None` once it hangs up.
    pub async fn receive_message(&mut self) -> anyhow::Result<Option<Message>> {
        let mut buf = vec![0u8; 4096];

        loop {
            match Message::next_frame(&self.read_buffer) {
                Frame::Partial => {}
                Frame::Oversized(len) => {
                    anyhow::bail!("Daemon sent a {} byte frame", len);
                }
                Frame::Complete { message, consumed } => {
                    self.read_buffer.drain(..consumed);
                    match message {
                        Ok(msg) => return Ok(Some(msg)),
                        // Likely a broadcast from a newer daemon; skip it.
                        Err(_) => continue,
                    }
                }
            }

            match self.stream.read(&mut buf).await {
                Ok(0) => return Ok(None),
                Ok(n) => self.read_buffer.extend_from_slice(&buf[..n]),
                Err(e) => return Err(anyhow::anyhow!("Read error: {}", e)),
            }
        }
    }
}
