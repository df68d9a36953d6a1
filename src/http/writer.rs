use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Status line, header block and blank separator line.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Writes one response: the serialized head, then the body. File bodies are
/// copied straight from disk.
pub struct ResponseWriter {
    head: Vec<u8>,
    body: Body,
    written: u64,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        Self {
            head: serialize_head(&response),
            body: response.body,
            written: 0,
        }
    }

    /// Bytes handed to the stream so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        write_all_counted(stream, &self.head, &mut self.written).await?;

        match &mut self.body {
            Body::Bytes(bytes) => {
                write_all_counted(stream, bytes, &mut self.written).await?;
            }
            Body::File { file, len } => {
                // never more than the announced Content-Length
                let mut body = (&mut *file).take(*len);
                let copied = tokio::io::copy(&mut body, stream).await?;
                self.written += copied;
                if copied < *len {
                    anyhow::bail!("file ended after {copied} of {len} bytes");
                }
            }
        }

        stream.flush().await?;
        Ok(self.written)
    }
}

async fn write_all_counted<W>(
    stream: &mut W,
    buf: &[u8],
    written: &mut u64,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut offset = 0;
    while offset < buf.len() {
        let n = stream.write(&buf[offset..]).await?;

        if n == 0 {
            return Err(anyhow::anyhow!("connection closed while writing"));
        }

        offset += n;
        *written += n as u64;
    }
    Ok(())
}
