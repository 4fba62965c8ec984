//! Shared inputs for the quill benchmarks.

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    input: &'static [u8],
}

impl TestCase {
    pub const fn new(name: &'static str, group: TestGroup, input: &'static [u8]) -> Self {
        Self { name, group, input }
    }

    pub const fn small(name: &'static str, input: &'static [u8]) -> Self {
        Self::new(name, TestGroup::Small, input)
    }

    pub const fn large(name: &'static str, input: &'static [u8]) -> Self {
        Self::new(name, TestGroup::Large, input)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn input(&self) -> &'static [u8] {
        self.input
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestGroup {
    Small,
    Large,
}

pub const GET_SMALL: &[u8] = b"GET /hello HTTP/1.1\r\nHost: 127.0.0.1:8080\r\nUser-Agent: curl/8.5.0\r\nAccept: */*\r\n\r\n";

pub const GET_LARGE: &[u8] = b"GET /blog/my-first-post/edit?draft=true&page=3 HTTP/1.1\r\n\
Host: www.example.com\r\n\
Connection: keep-alive\r\n\
Cache-Control: max-age=0\r\n\
sec-ch-ua: \"Chromium\";v=\"124\", \"Google Chrome\";v=\"124\", \"Not-A.Brand\";v=\"99\"\r\n\
sec-ch-ua-mobile: ?0\r\n\
sec-ch-ua-platform: \"Linux\"\r\n\
Upgrade-Insecure-Requests: 1\r\n\
User-Agent: Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36\r\n\
Accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8\r\n\
Sec-Fetch-Site: none\r\n\
Sec-Fetch-Mode: navigate\r\n\
Sec-Fetch-User: ?1\r\n\
Sec-Fetch-Dest: document\r\n\
Accept-Encoding: gzip, deflate, br, zstd\r\n\
Accept-Language: en-US,en;q=0.9\r\n\
If-None-Match: \"5f2b-18c3a\"\r\n\
If-Modified-Since: Sun, 06 Nov 1994 08:49:37 GMT\r\n\
Cookie: session=8c6f1a2b4d; theme=dark; consent=yes\r\n\r\n";

pub const POST_CHUNKED: &[u8] = b"POST /upload HTTP/1.1\r\n\
Host: www.example.com\r\n\
Transfer-Encoding: chunked\r\n\
Content-Type: text/plain\r\n\r\n\
1a\r\nabcdefghijklmnopqrstuvwxyz\r\n\
10\r\n0123456789abcdef\r\n\
4;name=value\r\nWiki\r\n\
5\r\npedia\r\n\
0\r\n\r\n";

pub const REQUESTS: [TestCase; 3] = [
    TestCase::small("get_small", GET_SMALL),
    TestCase::large("get_large", GET_LARGE),
    TestCase::small("post_chunked", POST_CHUNKED),
];

/// Route patterns of a mid-sized application, in registration order.
pub const ROUTE_PATTERNS: [&str; 12] = [
    "/",
    "/about",
    "/login",
    "/logout",
    "/blog",
    "/blog/{post}",
    "/blog/{post}/edit",
    "/blog/{post}/comments",
    "/blog/{post}/comments/{comment}",
    "/users/{user}",
    "/users/{user}/settings",
    "/static/{file}",
];
