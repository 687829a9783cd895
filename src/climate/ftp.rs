//! Anonymous, passive-mode, binary FTP: just enough to mirror a directory
//! tree from the projection archive.

use {
    log::debug,
    regex::Regex,
    std::{
        io::{self, BufRead, BufReader, Read, Write},
        net::{Ipv4Addr, SocketAddrV4, TcpStream},
    },
    thiserror::Error,
};

const PORT: u16 = 21;

#[derive(Debug, Error)]
pub enum FtpError {
    #[error("unexpected reply to {command}: {code} {message}")]
    Reply {
        command: String,
        code: u32,
        message: String,
    },
    /// Permanent failure (5xx) of a transfer, e.g. retrieving a directory
    #[error("{path} unavailable: {code} {message}")]
    Unavailable {
        path: String,
        code: u32,
        message: String,
    },
    #[error("malformed reply \"{0}\"")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub code: u32,
    pub message: String,
}

/// Reads one reply, joining the lines of a multi-line (`123-`) reply.
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply, FtpError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(FtpError::Malformed("connection closed".to_string()));
    }
    let line = line.trim_end().to_string();
    let code: u32 = line
        .get(..3)
        .and_then(|c| c.parse().ok())
        .ok_or_else(|| FtpError::Malformed(line.clone()))?;
    let mut message = line.get(4..).unwrap_or("").to_string();

    if line.as_bytes().get(3) == Some(&b'-') {
        let terminator = format!("{} ", code);
        loop {
            let mut next = String::new();
            if reader.read_line(&mut next)? == 0 {
                return Err(FtpError::Malformed(line));
            }
            let next = next.trim_end();
            message.push('\n');
            if let Some(rest) = next.strip_prefix(&terminator) {
                message.push_str(rest);
                break;
            }
            message.push_str(next);
        }
    }

    Ok(Reply { code, message })
}

/// Data connection address from a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply.
pub fn passive_address(message: &str) -> Result<SocketAddrV4, FtpError> {
    let re = Regex::new(r"(\d+),(\d+),(\d+),(\d+),(\d+),(\d+)").map_err(|e| FtpError::Malformed(e.to_string()))?;
    let caps = re
        .captures(message)
        .ok_or_else(|| FtpError::Malformed(message.to_string()))?;
    let mut n = [0u8; 6];
    for (i, value) in n.iter_mut().enumerate() {
        *value = caps[i + 1]
            .parse()
            .map_err(|_| FtpError::Malformed(message.to_string()))?;
    }
    Ok(SocketAddrV4::new(
        Ipv4Addr::new(n[0], n[1], n[2], n[3]),
        u16::from(n[4]) << 8 | u16::from(n[5]),
    ))
}

pub struct FtpClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl FtpClient {
    /// Connects to `host` and logs in anonymously in binary mode.
    pub fn connect(host: &str) -> Result<Self, FtpError> {
        let stream = TcpStream::connect((host, PORT))?;
        let mut client = FtpClient {
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
        };
        client.expect("connect", &[220])?;

        client.send("USER anonymous")?;
        let reply = client.expect("USER", &[230, 331])?;
        if reply.code == 331 {
            client.command("PASS anonymous@", &[230, 202])?;
        }
        client.command("TYPE I", &[200])?;
        Ok(client)
    }

    fn send(&mut self, command: &str) -> Result<(), FtpError> {
        debug!("FTP > {}", command);
        write!(self.writer, "{}\r\n", command)?;
        self.writer.flush()?;
        Ok(())
    }

    fn expect(&mut self, command: &str, codes: &[u32]) -> Result<Reply, FtpError> {
        let reply = read_reply(&mut self.reader)?;
        if codes.contains(&reply.code) {
            Ok(reply)
        } else {
            Err(FtpError::Reply {
                command: command.to_string(),
                code: reply.code,
                message: reply.message,
            })
        }
    }

    fn command(&mut self, command: &str, codes: &[u32]) -> Result<Reply, FtpError> {
        self.send(command)?;
        self.expect(command, codes)
    }

    fn open_data(&mut self) -> Result<TcpStream, FtpError> {
        let reply = self.command("PASV", &[227])?;
        Ok(TcpStream::connect(passive_address(&reply.message)?)?)
    }

    /// Starts a transfer; a 5xx reply means `path` cannot be transferred.
    fn start_transfer(&mut self, verb: &str, path: &str) -> Result<TcpStream, FtpError> {
        let data = self.open_data()?;
        self.send(&format!("{} {}", verb, path))?;
        let reply = read_reply(&mut self.reader)?;
        match reply.code {
            125 | 150 => Ok(data),
            500..=599 => Err(FtpError::Unavailable {
                path: path.to_string(),
                code: reply.code,
                message: reply.message,
            }),
            code => Err(FtpError::Reply {
                command: verb.to_string(),
                code,
                message: reply.message,
            }),
        }
    }

    /// Names of the entries of a remote directory
    pub fn list(&mut self, path: &str) -> Result<Vec<String>, FtpError> {
        let mut data = self.start_transfer("NLST", path)?;
        let mut listing = String::new();
        data.read_to_string(&mut listing)?;
        drop(data);
        self.expect("NLST", &[226, 250])?;

        Ok(listing
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(|l| l.rsplit('/').next().unwrap_or(l).to_string())
            .collect())
    }

    /// Copies a remote file into `w`, returning the number of bytes.
    pub fn retrieve<W: Write>(&mut self, path: &str, w: &mut W) -> Result<u64, FtpError> {
        let mut data = self.start_transfer("RETR", path)?;
        let bytes = io::copy(&mut data, w)?;
        drop(data);
        self.expect("RETR", &[226, 250])?;
        Ok(bytes)
    }

    pub fn quit(mut self) -> Result<(), FtpError> {
        self.command("QUIT", &[221]).map(|_| ())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_line_reply() {
        let mut input = "220 Welcome\r\n".as_bytes();
        assert_eq!(
            read_reply(&mut input).unwrap(),
            Reply {
                code: 220,
                message: "Welcome".to_string()
            }
        );
    }

    #[test]
    fn multi_line_reply() {
        let mut input = "230-Welcome\r\n  to the archive\r\n230 Login ok\r\n150 next\r\n".as_bytes();
        let reply = read_reply(&mut input).unwrap();
        assert_eq!(reply.code, 230);
        assert_eq!(reply.message, "Welcome\n  to the archive\nLogin ok");
        assert_eq!(read_reply(&mut input).unwrap().code, 150);
    }

    #[test]
    fn malformed_reply() {
        assert!(matches!(
            read_reply(&mut "hello\r\n".as_bytes()),
            Err(FtpError::Malformed(_))
        ));
        assert!(matches!(read_reply(&mut "".as_bytes()), Err(FtpError::Malformed(_))));
    }

    #[test]
    fn passive() {
        assert_eq!(
            passive_address("Entering Passive Mode (128,115,57,12,195,80).").unwrap(),
            SocketAddrV4::new(Ipv4Addr::new(128, 115, 57, 12), 195 * 256 + 80)
        );
        assert!(passive_address("Entering Passive Mode").is_err());
    }
}
