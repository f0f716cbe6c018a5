use serde::Serialize;

/// Reusable component snippet shown in the library panel.
#[derive(Debug, Clone, Serialize)]
pub struct SnippetCard {
    pub title: String,
    pub description: String,
    pub source: String,
    pub tags: Vec<String>,
}

/// Larger starting-point script.
#[derive(Debug, Clone, Serialize)]
pub struct QuickTemplate {
    pub title: String,
    pub summary: String,
    pub source: String,
}

/// Card describing one remote backend endpoint, with a call snippet.
#[derive(Debug, Clone, Serialize)]
pub struct BackendAssistant {
    pub title: String,
    pub description: String,
    pub method: String,
    pub path: String,
    pub source: String,
}

/// Static catalog of canned snippets, templates, and backend assistants.
/// Pure data; inserting an entry into the editor is the caller's concern.
pub struct Catalog {
    snippets: Vec<SnippetCard>,
    templates: Vec<QuickTemplate>,
    assistants: Vec<BackendAssistant>,
}

impl Catalog {
    pub fn builtin(backend_url: &str) -> Self {
        let base = backend_url.trim_end_matches('/');
        Self {
            snippets: vec![
                SnippetCard {
                    title: "Weather API".to_string(),
                    description: "Fetch city-level conditions from the weather service."
                        .to_string(),
                    source: "from components.weather import get_weather\nprint(get_weather('Lisbon'))"
                        .to_string(),
                    tags: vec!["data".to_string(), "http".to_string()],
                },
                SnippetCard {
                    title: "Chat Messenger".to_string(),
                    description: "Send proactive updates to a chat channel.".to_string(),
                    source: "from components.chat import send_message\nsend_message('123456', 'Hello from the workspace')"
                        .to_string(),
                    tags: vec!["messaging".to_string(), "alerts".to_string()],
                },
                SnippetCard {
                    title: "Sentiment AI".to_string(),
                    description: "Score text through the backend model service.".to_string(),
                    source: format!(
                        "import requests\ntext = 'The workspace feels fast today'\nres = requests.post('{base}/predict_sentiment', json={{'text': text}})\nprint(res.json())"
                    ),
                    tags: vec!["ml".to_string(), "nlp".to_string()],
                },
                SnippetCard {
                    title: "Webhook Relay".to_string(),
                    description: "Listen for inbound events and print their payloads."
                        .to_string(),
                    source: "import http.server, socketserver\nPORT = 8081\nclass Handler(http.server.SimpleHTTPRequestHandler):\n    def do_POST(self):\n        length = int(self.headers['Content-Length'])\n        print('Webhook payload:', self.rfile.read(length))\nwith socketserver.TCPServer(('', PORT), Handler) as httpd:\n    print('listening on', PORT)\n    httpd.serve_forever()"
                        .to_string(),
                    tags: vec!["events".to_string(), "server".to_string()],
                },
                SnippetCard {
                    title: "File Drop Capture".to_string(),
                    description: "List sandbox files and emit their metadata as JSON."
                        .to_string(),
                    source: "import os, json\nfrom datetime import datetime\nfiles = os.listdir('.')\nprint(json.dumps({'timestamp': datetime.utcnow().isoformat(), 'files': files}, indent=2))"
                        .to_string(),
                    tags: vec!["io".to_string(), "ops".to_string()],
                },
            ],
            templates: vec![
                QuickTemplate {
                    title: "Sentiment Router".to_string(),
                    summary: "Route text to backend sentiment and fan out alerts.".to_string(),
                    source: format!(
                        "import requests\nmessages = ['Ship it', 'This is too slow']\nfor msg in messages:\n    res = requests.post('{base}/predict_sentiment', json={{'text': msg}}).json()\n    print(msg, '=>', res['sentiment'])"
                    ),
                },
                QuickTemplate {
                    title: "Voice Note Summarizer".to_string(),
                    summary: "Stub pipeline to capture voice text and produce a digest."
                        .to_string(),
                    source: "voice_text = 'Draft sales follow up for ACME'\nprint('Captured voice note:', voice_text)\nprint('Summary:', voice_text[:50] + '...')"
                        .to_string(),
                },
                QuickTemplate {
                    title: "Weather-to-Message Bot".to_string(),
                    summary: "Checks weather and crafts a chat-ready string.".to_string(),
                    source: "from components.weather import get_weather\nfrom components.chat import send_message\ncity = 'Lisbon'\ntemp = get_weather(city)\nmessage = f'Heads up! {city} is {temp} degrees'\nprint('Preview:', message)"
                        .to_string(),
                },
            ],
            assistants: vec![
                BackendAssistant {
                    title: "Health Probe".to_string(),
                    description: "Pulls backend readiness, endpoints, and model load status."
                        .to_string(),
                    method: "GET".to_string(),
                    path: format!("{base}/health"),
                    source: format!("import requests\nprint(requests.get('{base}/health').json())"),
                },
                BackendAssistant {
                    title: "Blueprint Generator".to_string(),
                    description: "Turn an idea into a structured build plan and components list."
                        .to_string(),
                    method: "POST".to_string(),
                    path: format!("{base}/blueprint"),
                    source: format!(
                        "import requests\nidea = 'Alert me when Lisbon weather spikes'\nprint(requests.post('{base}/blueprint', json={{'idea': idea}}).json())"
                    ),
                },
            ],
        }
    }

    /// Case-insensitive filter over title, description, and tags. An empty
    /// query returns everything.
    pub fn search(&self, query: &str) -> Vec<&SnippetCard> {
        let query = query.to_lowercase();
        self.snippets
            .iter()
            .filter(|card| {
                if query.is_empty() {
                    return true;
                }
                card.title.to_lowercase().contains(&query)
                    || card.description.to_lowercase().contains(&query)
                    || card.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn snippet(&self, title: &str) -> Option<&SnippetCard> {
        self.snippets.iter().find(|card| card.title == title)
    }

    pub fn template(&self, title: &str) -> Option<&QuickTemplate> {
        self.templates.iter().find(|t| t.title == title)
    }

    pub fn assistant(&self, title: &str) -> Option<&BackendAssistant> {
        self.assistants.iter().find(|a| a.title == title)
    }

    pub fn templates(&self) -> &[QuickTemplate] {
        &self.templates
    }

    pub fn assistants(&self) -> &[BackendAssistant] {
        &self.assistants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin("http://localhost:5000")
    }

    #[test]
    fn test_empty_query_returns_all() {
        assert_eq!(catalog().search("").len(), 5);
    }

    #[test]
    fn test_search_matches_title_case_insensitive() {
        let catalog = catalog();
        let hits = catalog.search("weather");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Weather API");
        assert_eq!(catalog.search("WEATHER").len(), 1);
    }

    #[test]
    fn test_search_matches_tags() {
        let catalog = catalog();
        let hits = catalog.search("nlp");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Sentiment AI");
    }

    #[test]
    fn test_search_matches_description() {
        let catalog = catalog();
        let hits = catalog.search("chat channel");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Chat Messenger");
    }

    #[test]
    fn test_search_no_match() {
        assert!(catalog().search("kubernetes").is_empty());
    }

    #[test]
    fn test_lookup_by_title() {
        let catalog = catalog();
        assert!(catalog.snippet("Weather API").is_some());
        assert!(catalog.template("Sentiment Router").is_some());
        assert!(catalog.assistant("Health Probe").is_some());
        assert!(catalog.snippet("Nope").is_none());
    }

    #[test]
    fn test_assistant_snippets_use_backend_url() {
        let catalog = Catalog::builtin("http://backend:9999/");
        let probe = catalog.assistant("Health Probe").unwrap();
        assert_eq!(probe.path, "http://backend:9999/health");
        assert!(probe.source.contains("http://backend:9999/health"));
    }
}
