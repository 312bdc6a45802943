//! Client side of the SOCKS4 and SOCKS5 CONNECT handshakes.
//!
//! Both run over an already deadline-bound connection, so a proxy that stalls
//! mid-handshake times out like any other peer.

use std::io;
use std::net::{IpAddr, Ipv4Addr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const SOCKS4_VERSION: u8 = 0x04;
const SOCKS4_GRANTED: u8 = 0x5A;

const SOCKS5_VERSION: u8 = 0x05;
const CMD_CONNECT: u8 = 0x01;
const AUTH_NONE: u8 = 0x00;
const AUTH_UNACCEPTABLE: u8 = 0xFF;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// SOCKS4 CONNECT to `ip:port` with an empty user id.
pub(super) async fn connect_v4<S>(stream: &mut S, ip: Ipv4Addr, port: u16) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut request = Vec::with_capacity(9);
    request.push(SOCKS4_VERSION);
    request.push(CMD_CONNECT);
    request.extend_from_slice(&port.to_be_bytes());
    request.extend_from_slice(&ip.octets());
    request.push(0x00);
    stream.write_all(&request).await?;

    let mut reply = [0u8; 8];
    stream.read_exact(&mut reply).await?;
    if reply[1] != SOCKS4_GRANTED {
        return Err(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            format!("SOCKS4 proxy rejected request (code {:#04x})", reply[1]),
        ));
    }
    Ok(())
}

/// SOCKS5 CONNECT to `host:port`, no authentication.
///
/// Hostnames are sent as-is for the proxy to resolve.
pub(super) async fn connect_v5<S>(stream: &mut S, host: &str, port: u16) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&[SOCKS5_VERSION, 1, AUTH_NONE]).await?;

    let mut choice = [0u8; 2];
    stream.read_exact(&mut choice).await?;
    if choice[0] != SOCKS5_VERSION {
        return Err(protocol_error(format!(
            "unexpected SOCKS version {} in method reply",
            choice[0]
        )));
    }
    match choice[1] {
        AUTH_NONE => {}
        AUTH_UNACCEPTABLE => {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "SOCKS5 proxy requires authentication",
            ))
        }
        other => {
            return Err(protocol_error(format!(
                "SOCKS5 proxy chose unoffered method {}",
                other
            )))
        }
    }

    let mut request = vec![SOCKS5_VERSION, CMD_CONNECT, 0x00];
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            request.push(ATYP_IPV4);
            request.extend_from_slice(&v4.octets());
        }
        Ok(IpAddr::V6(v6)) => {
            request.push(ATYP_IPV6);
            request.extend_from_slice(&v6.octets());
        }
        Err(_) => {
            let name = host.as_bytes();
            let len = u8::try_from(name.len()).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "hostname too long for SOCKS5")
            })?;
            request.push(ATYP_DOMAIN);
            request.push(len);
            request.extend_from_slice(name);
        }
    }
    request.extend_from_slice(&port.to_be_bytes());
    stream.write_all(&request).await?;

    let mut head = [0u8; 4];
    stream.read_exact(&mut head).await?;
    if head[0] != SOCKS5_VERSION {
        return Err(protocol_error(format!(
            "unexpected SOCKS version {} in connect reply",
            head[0]
        )));
    }
    if head[1] != 0x00 {
        return Err(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            format!("SOCKS5 proxy: {}", reply_message(head[1])),
        ));
    }

    // Bound address, unused
    let skip = match head[3] {
        ATYP_IPV4 => 4 + 2,
        ATYP_IPV6 => 16 + 2,
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await?;
            usize::from(len[0]) + 2
        }
        other => {
            return Err(protocol_error(format!(
                "unknown address type {} in connect reply",
                other
            )))
        }
    };
    let mut bound = vec![0u8; skip];
    stream.read_exact(&mut bound).await?;
    Ok(())
}

fn protocol_error(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

fn reply_message(code: u8) -> &'static str {
    match code {
        0x01 => "general failure",
        0x02 => "connection not allowed by ruleset",
        0x03 => "network unreachable",
        0x04 => "host unreachable",
        0x05 => "connection refused",
        0x06 => "TTL expired",
        0x07 => "command not supported",
        0x08 => "address type not supported",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_v4_handshake_bytes() {
        let (mut client, mut proxy) = tokio::io::duplex(64);

        let server = tokio::spawn(async move {
            let mut request = [0u8; 9];
            proxy.read_exact(&mut request).await.unwrap();
            proxy
                .write_all(&[0x00, SOCKS4_GRANTED, 0, 0, 0, 0, 0, 0])
                .await
                .unwrap();
            request
        });

        connect_v4(&mut client, Ipv4Addr::new(192, 0, 2, 7), 43)
            .await
            .unwrap();
        let request = server.await.unwrap();
        assert_eq!(request, [4, 1, 0, 43, 192, 0, 2, 7, 0]);
    }

    #[tokio::test]
    async fn test_v4_rejection() {
        let (mut client, mut proxy) = tokio::io::duplex(64);
        tokio::spawn(async move {
            let mut request = [0u8; 9];
            proxy.read_exact(&mut request).await.unwrap();
            proxy.write_all(&[0x00, 0x5B, 0, 0, 0, 0, 0, 0]).await.unwrap();
        });

        let err = connect_v4(&mut client, Ipv4Addr::LOCALHOST, 43)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    }

    #[tokio::test]
    async fn test_v5_sends_domain_name() {
        let (mut client, mut proxy) = tokio::io::duplex(256);

        let server = tokio::spawn(async move {
            let mut greeting = [0u8; 3];
            proxy.read_exact(&mut greeting).await.unwrap();
            proxy.write_all(&[5, 0]).await.unwrap();

            let mut head = [0u8; 5];
            proxy.read_exact(&mut head).await.unwrap();
            let mut name = vec![0u8; head[4] as usize + 2];
            proxy.read_exact(&mut name).await.unwrap();
            proxy
                .write_all(&[5, 0, 0, ATYP_IPV4, 127, 0, 0, 1, 0, 43])
                .await
                .unwrap();
            (greeting, head, name)
        });

        connect_v5(&mut client, "whois.example", 43).await.unwrap();
        let (greeting, head, name) = server.await.unwrap();
        assert_eq!(greeting, [5, 1, 0]);
        assert_eq!(head, [5, 1, 0, ATYP_DOMAIN, 13]);
        assert_eq!(&name[..13], b"whois.example");
        assert_eq!(&name[13..], &[0, 43]);
    }

    #[tokio::test]
    async fn test_v5_requires_auth_is_error() {
        let (mut client, mut proxy) = tokio::io::duplex(64);
        tokio::spawn(async move {
            let mut greeting = [0u8; 3];
            proxy.read_exact(&mut greeting).await.unwrap();
            proxy.write_all(&[5, AUTH_UNACCEPTABLE]).await.unwrap();
        });

        let err = connect_v5(&mut client, "whois.example", 43)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_v5_connect_failure_code() {
        let (mut client, mut proxy) = tokio::io::duplex(256);
        tokio::spawn(async move {
            let mut greeting = [0u8; 3];
            proxy.read_exact(&mut greeting).await.unwrap();
            proxy.write_all(&[5, 0]).await.unwrap();
            let mut request = [0u8; 10];
            proxy.read_exact(&mut request).await.unwrap();
            proxy
                .write_all(&[5, 0x05, 0, ATYP_IPV4, 0, 0, 0, 0, 0, 0])
                .await
                .unwrap();
        });

        let err = connect_v5(&mut client, "192.0.2.1", 43).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
        assert!(err.to_string().contains("connection refused"));
    }
}
