/// A scripted stream fed to the reassembly benchmarks.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    script: StreamScript,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, script: StreamScript) -> Self {
        Self { name, group, script }
    }

    pub fn small(name: &'static str, script: StreamScript) -> Self {
        Self::new(name, TestGroup::Small, script)
    }

    pub fn normal(name: &'static str, script: StreamScript) -> Self {
        Self::new(name, TestGroup::Normal, script)
    }

    pub fn large(name: &'static str, script: StreamScript) -> Self {
        Self::new(name, TestGroup::Large, script)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn script(&self) -> &StreamScript {
        &self.script
    }
}

/// Decoded header fields of one request, in arrival order, plus its body.
#[derive(Debug, Copy, Clone)]
pub struct StreamScript {
    headers: &'static [(&'static str, &'static str)],
    body: &'static [u8],
}

impl StreamScript {
    pub const fn new(headers: &'static [(&'static str, &'static str)], body: &'static [u8]) -> Self {
        Self { headers, body }
    }

    pub fn headers(&self) -> &'static [(&'static str, &'static str)] {
        self.headers
    }

    pub fn body(&self) -> &'static [u8] {
        self.body
    }

    /// Bytes handed to the stream, used for throughput
    pub fn input_len(&self) -> usize {
        self.headers.iter().map(|(name, value)| name.len() + value.len()).sum::<usize>() + self.body.len()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}
